//! Client error types.

use mall_auth::AuthError;
use mall_core::DomainError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure talking to the backend REST API.
///
/// Never clears prior UI state: controllers turn it into a dismissible banner
/// via [`ClientError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success status. `message` comes from the body's `message` (or
    /// `error`) field when present.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// 401 from the backend.
    #[error("authentication required")]
    Unauthorized,

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Parse(String),

    /// Rejected locally before any network call.
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Banner text.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Api { status, .. } => format!("The server returned an error ({status})."),
            ClientError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ClientError::Parse(_) => "The server sent an unexpected response.".to_string(),
            ClientError::Validation(e) => e.user_message(),
            ClientError::Config(_) => "This feature is not available.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Parse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<ClientError> for AuthError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unauthorized => AuthError::SessionExpired,
            ClientError::Network(msg) => AuthError::Network(msg),
            ClientError::Api { status, message } => AuthError::Backend { status, message },
            ClientError::Validation(e) => AuthError::InvalidInput(e.user_message()),
            other => AuthError::Backend {
                status: 0,
                message: other.to_string(),
            },
        }
    }
}
