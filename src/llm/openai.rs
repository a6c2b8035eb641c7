//! OpenAI-compatible chat completions backend.
//!
//! Works against api.openai.com and any server exposing
//! `/v1/chat/completions` with bearer authentication.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{error_from_response, http_client, ChatBackend, ChatMessage, ChatRequest};
use super::{LlmConfig, LlmError};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.effective_endpoint(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.effective_model().to_string(),
        })
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.backend_id().to_string()))
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn backend_id(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("POST {} (model {})", url, self.model);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_request)?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let status = resp.status().as_u16();
        let completion: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::from_body(status, e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("completion contained no message".to_string()))
    }

    async fn ping(&self) -> Result<(), LlmError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/models", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(LlmError::from_request)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp).await)
        }
    }
}
