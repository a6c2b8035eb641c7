//! Structuring client: turns anonymized text into a [`StructuredSummary`]
//! through a chat-completion backend.
//!
//! Two backends are supported:
//! - OpenAI-compatible cloud APIs (`/v1/chat/completions`)
//! - Ollama local inference (`/api/chat`)
//!
//! The backend is chosen once from [`LlmConfig`]; a failed call is reported
//! as-is, with no retry and no fallback to the other backend.
//!
//! [`StructuredSummary`]: crate::models::StructuredSummary

mod backend;
mod config;
mod error;
mod ollama;
mod openai;
pub mod prompts;
mod response;
mod structuring;

use std::sync::Arc;

use tracing::debug;

pub use backend::{ChatBackend, ChatMessage, ChatRequest, Role};
pub use config::{LlmConfig, LlmProvider};
pub use error::LlmError;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use response::parse_summary;
pub use structuring::{Structurer, StructuringClient};

/// Build the configured structurer.
///
/// Fails only if the HTTP client cannot be constructed; a missing API key
/// surfaces on the first request.
pub fn build_structurer(config: &LlmConfig) -> Result<Arc<dyn Structurer>, LlmError> {
    debug!(
        "Using {} backend at {} (model {})",
        config.provider,
        config.effective_endpoint(),
        config.effective_model()
    );
    let structurer: Arc<dyn Structurer> = match config.provider {
        LlmProvider::OpenAI => Arc::new(StructuringClient::new(OpenAiBackend::new(config)?, config)),
        LlmProvider::Ollama => Arc::new(StructuringClient::new(OllamaBackend::new(config)?, config)),
    };
    Ok(structurer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_structurer_reports_model() {
        let openai = build_structurer(&LlmConfig::default()).unwrap();
        assert_eq!(openai.model_id(), "gpt-4");

        let ollama =
            build_structurer(&LlmConfig::default().with_provider(LlmProvider::Ollama).with_model("llama3"))
                .unwrap();
        assert_eq!(ollama.model_id(), "llama3");
    }

    #[tokio::test]
    async fn test_connection_false_without_key() {
        let structurer = build_structurer(&LlmConfig::default()).unwrap();
        assert!(!structurer.test_connection().await);
    }
}
