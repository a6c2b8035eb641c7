//! Chat-completion backend abstraction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{LlmConfig, LlmError};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A service that turns a chat request into the assistant's reply text.
///
/// Implementations are stateless per call and shared across concurrent
/// analyses.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short backend name ("openai", "ollama").
    fn backend_id(&self) -> &'static str;

    /// Model that serves requests.
    fn model(&self) -> &str;

    /// Send one request; returns the raw assistant message content.
    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), LlmError>;
}

/// HTTP client shared by the backends.
pub(crate) fn http_client(config: &LlmConfig) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| LlmError::Client(e.to_string()))
}

/// Read a non-success response into a classified error.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> LlmError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    LlmError::from_response(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&ChatMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }
}
