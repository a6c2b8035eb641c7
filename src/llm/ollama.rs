//! Ollama local inference backend (`/api/chat`, non-streaming).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{error_from_response, http_client, ChatBackend, ChatMessage, ChatRequest};
use super::{LlmConfig, LlmError};

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

/// Ollama chat response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.effective_endpoint(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.effective_model().to_string(),
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn backend_id(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.endpoint);
        debug!("POST {} (model {})", url, self.model);
        let resp = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_request)?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let status = resp.status().as_u16();
        let chat: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::from_body(status, e))?;

        if let Some(error) = chat.error {
            return Err(LlmError::Api {
                status,
                message: error,
            });
        }

        chat.message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::Parse("chat response contained no message".to_string()))
    }

    async fn ping(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/tags", self.endpoint);
        let resp = self
            .authorize(self.client.get(&url))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OllamaBackend {
        let config = LlmConfig::default()
            .with_provider(LlmProvider::Ollama)
            .with_endpoint(&server.uri());
        OllamaBackend::new(&config).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user("doc")],
            temperature: 0.3,
            max_tokens: 1500,
        }
    }

    #[tokio::test]
    async fn test_chat_non_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "mistral",
                "stream": false,
                "options": {"num_predict": 1500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "mistral",
                "message": {"role": "assistant", "content": "réponse"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(backend(&server).chat(&request()).await.unwrap(), "réponse");
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "model 'mistral' not found"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server).chat(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_ping_uses_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(backend(&server).ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_ping_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(backend(&server).ping().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let config = LlmConfig::default()
            .with_provider(LlmProvider::Ollama)
            .with_endpoint("http://127.0.0.1:1");
        let err = OllamaBackend::new(&config)
            .unwrap()
            .chat(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": {"role": "assistant", "content": "{}"}}))
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut config = LlmConfig::default()
            .with_provider(LlmProvider::Ollama)
            .with_endpoint(&server.uri());
        config.timeout_secs = 1;
        let err = OllamaBackend::new(&config)
            .unwrap()
            .chat(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unreachable(ref m) if m.contains("timed out")));
    }
}
