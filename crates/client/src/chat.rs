//! Chat assistant microservice client.
//!
//! Input is enabled only while the service is [`Connectivity::Online`]; the
//! state comes from `GET /health` and is downgraded to offline when a request
//! fails to reach the service.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::connectivity::Connectivity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("chat service unavailable ({0:?})")]
    Unavailable(Connectivity),

    #[error("message is empty")]
    EmptyMessage,

    #[error("network error: {0}")]
    Network(String),

    #[error("chat service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid chat response: {0}")]
    Parse(String),
}

impl ChatError {
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Unavailable(state) => state.status_message().to_string(),
            ChatError::EmptyMessage => "Type a message first.".to_string(),
            ChatError::Network(_) => "The assistant could not be reached. Please try again.".to_string(),
            ChatError::Api { .. } | ChatError::Parse(_) => {
                "The assistant could not answer right now.".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Assistant answer to one message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    Wrapped { messages: Vec<ChatMessage> },
    Bare(Vec<ChatMessage>),
}

pub struct ChatClient {
    http: Client,
    base_url: Option<String>,
    state: watch::Sender<Connectivity>,
    session_id: Mutex<String>,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;
        Ok(Self::with_parts(http, Some(config.base_url), Connectivity::Offline))
    }

    /// A client whose every call reports "service unavailable".
    pub fn unconfigured() -> Self {
        Self::with_parts(Client::new(), None, Connectivity::Unconfigured)
    }

    /// `CHAT_API_URL`; missing or unusable config yields an unconfigured client.
    pub fn from_env() -> Self {
        match ChatConfig::from_env() {
            Ok(config) => Self::new(config).unwrap_or_else(|e| {
                tracing::warn!("chat client disabled: {e}");
                Self::unconfigured()
            }),
            Err(e) => {
                tracing::info!("chat client disabled: {e}");
                Self::unconfigured()
            }
        }
    }

    fn with_parts(http: Client, base_url: Option<String>, initial: Connectivity) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            http,
            base_url,
            state,
            session_id: Mutex::new(Uuid::now_v7().to_string()),
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }

    pub fn session_id(&self) -> String {
        self.session_id
            .lock()
            .map(|id| id.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Start a fresh conversation.
    pub fn reset_session(&self) -> String {
        let fresh = Uuid::now_v7().to_string();
        self.set_session_id(fresh.clone());
        fresh
    }

    fn set_session_id(&self, id: String) {
        match self.session_id.lock() {
            Ok(mut slot) => *slot = id,
            Err(poisoned) => *poisoned.into_inner() = id,
        }
    }

    fn set_state(&self, next: Connectivity) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::info!(from = ?*current, to = ?next, "chat connectivity changed");
            *current = next;
            true
        });
    }

    fn url(&self, path: &str) -> Result<String, ChatError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ChatError::Unavailable(Connectivity::Unconfigured))?;
        Ok(format!("{base}/{}", path.trim_start_matches('/')))
    }

    /// Probe `GET /health` and record the result.
    pub async fn check_health(&self) -> Connectivity {
        let Ok(url) = self.url("health") else {
            return Connectivity::Unconfigured;
        };

        let next = match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => Connectivity::Online,
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "chat health probe failed");
                Connectivity::Offline
            }
            Err(e) => {
                tracing::warn!("chat health probe failed: {e}");
                Connectivity::Offline
            }
        };
        self.set_state(next);
        next
    }

    /// Send a message. Fails without a request unless the last probe saw the
    /// service online.
    pub async fn send(&self, message: &str) -> Result<ChatReply, ChatError> {
        let state = self.connectivity();
        if !state.is_online() {
            return Err(ChatError::Unavailable(state));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session_id = self.session_id();
        let request = self.http.post(self.url("chat/send")?).json(&SendRequest {
            message,
            session_id: &session_id,
        });

        let reply: ChatReply = self.execute(request).await?;
        if reply.session_id != session_id {
            self.set_session_id(reply.session_id.clone());
        }
        Ok(reply)
    }

    /// Messages of the current session, oldest first.
    pub async fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let state = self.connectivity();
        if !state.is_online() {
            return Err(ChatError::Unavailable(state));
        }

        let session_id = self.session_id();
        let request = self
            .http
            .get(self.url("chat/history")?)
            .query(&[("session_id", session_id.as_str())]);

        match self.execute(request).await? {
            HistoryResponse::Wrapped { messages } | HistoryResponse::Bare(messages) => Ok(messages),
        }
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ChatError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.set_state(Connectivity::Offline);
                return Err(ChatError::Network(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| ChatError::Parse(e.to_string()))
    }
}
