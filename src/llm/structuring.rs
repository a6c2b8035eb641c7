//! Structuring client: prompt building, the backend call and reply validation.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::backend::{ChatBackend, ChatMessage, ChatRequest};
use super::prompts::{build_analysis_prompt, truncate_content, SYSTEM_PROMPT};
use super::response::parse_summary;
use super::{LlmConfig, LlmError};
use crate::models::StructuredSummary;

/// Produces a [`StructuredSummary`] from anonymized text.
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Identifier recorded in analysis metadata.
    fn model_id(&self) -> &str;

    /// Structure one document's text. Makes exactly one backend call.
    async fn structure(&self, text: &str) -> Result<StructuredSummary, LlmError>;

    /// Whether the backend answers a lightweight request. Never errors.
    async fn test_connection(&self) -> bool;
}

/// [`Structurer`] over any [`ChatBackend`].
pub struct StructuringClient<B> {
    backend: B,
    max_content_chars: usize,
    temperature: f64,
    max_tokens: u32,
}

impl<B: ChatBackend> StructuringClient<B> {
    pub fn new(backend: B, config: &LlmConfig) -> Self {
        Self {
            backend,
            max_content_chars: config.max_content_chars,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build the request for `text` without sending it.
    pub fn build_request(&self, text: &str) -> ChatRequest {
        let content = truncate_content(text, self.max_content_chars);
        ChatRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_analysis_prompt(&content)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl<B: ChatBackend> Structurer for StructuringClient<B> {
    fn model_id(&self) -> &str {
        self.backend.model()
    }

    async fn structure(&self, text: &str) -> Result<StructuredSummary, LlmError> {
        let chars = text.chars().count();
        if chars > self.max_content_chars {
            debug!(
                "Truncating content from {} to {} chars",
                chars, self.max_content_chars
            );
        }
        let request = self.build_request(text);

        info!(
            "Structuring with {} ({})",
            self.backend.backend_id(),
            self.backend.model()
        );
        let reply = self.backend.chat(&request).await?;
        debug!("Backend replied with {} chars", reply.chars().count());

        parse_summary(&reply)
    }

    async fn test_connection(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("{} connection test failed: {}", self.backend.backend_id(), e);
                false
            }
        }
    }
}
