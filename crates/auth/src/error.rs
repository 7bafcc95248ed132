use thiserror::Error;

/// Authentication failure: bad credentials, dead session or an unreachable
/// backend during login. Never fatal; surfaced on the login form or as a
/// redirect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid login input: {0}")]
    InvalidInput(String),

    #[error("session expired or invalid")]
    SessionExpired,

    #[error("network error: {0}")]
    Network(String),

    #[error("auth backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

impl AuthError {
    /// Message for the login form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Incorrect email or password.".to_string(),
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::SessionExpired => "Your session has expired. Please sign in again.".to_string(),
            AuthError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            AuthError::Backend { message, .. } if !message.trim().is_empty() => message.clone(),
            AuthError::Backend { .. } => "The server could not complete the sign-in.".to_string(),
        }
    }
}
