//! Structuring backend errors.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key configured for the {0} backend")]
    MissingApiKey(String),

    #[error("Backend rejected credentials: {0}")]
    Auth(String),

    #[error("Backend quota or rate limit exhausted: {0}")]
    Quota(String),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model response is not valid JSON: {0}")]
    Parse(String),

    #[error("Model response is missing required fields: {0}")]
    Malformed(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl LlmError {
    /// Map a transport failure (connect, DNS, timeout) to an error.
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Unreachable(format!("request timed out: {}", e))
        } else {
            LlmError::Unreachable(e.to_string())
        }
    }

    /// Map a failure while reading the body of a success response.
    ///
    /// A dropped connection or timeout is still a transport failure; only a
    /// body that arrived but could not be decoded is a backend error.
    pub fn from_body(status: u16, e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_request() {
            Self::from_request(e)
        } else {
            LlmError::Api {
                status,
                message: format!("unexpected response body: {}", e),
            }
        }
    }

    /// Classify a non-success HTTP response.
    ///
    /// Understands OpenAI-style bodies (`{"error": {"message", "code"}}`) and
    /// Ollama-style bodies (`{"error": "..."}`); anything else is reported
    /// verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, message) = error_fields(body);
        let message = message.unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.chars().take(500).collect()
            }
        });

        match code.as_deref() {
            Some("insufficient_quota") | Some("rate_limit_exceeded") => {
                return LlmError::Quota(message)
            }
            Some("invalid_api_key") => return LlmError::Auth(message),
            _ => {}
        }

        match status {
            401 | 403 => LlmError::Auth(message),
            429 => LlmError::Quota(message),
            _ => LlmError::Api { status, message },
        }
    }
}

fn error_fields(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    match value.get("error") {
        Some(Value::String(message)) => (None, Some(message.clone())),
        Some(Value::Object(obj)) => {
            let code = obj
                .get("code")
                .and_then(Value::as_str)
                .or_else(|| obj.get("type").and_then(Value::as_str))
                .map(str::to_string);
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            (code, message)
        }
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(LlmError::from_response(401, ""), LlmError::Auth(_)));
        assert!(matches!(LlmError::from_response(403, "nope"), LlmError::Auth(_)));
        assert!(matches!(LlmError::from_response(429, ""), LlmError::Quota(_)));
        assert!(matches!(
            LlmError::from_response(500, "boom"),
            LlmError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_openai_quota_code() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        match LlmError::from_response(400, body) {
            LlmError::Quota(msg) => assert_eq!(msg, "You exceeded your current quota"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_openai_invalid_key_code() {
        let body = r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#;
        assert!(matches!(LlmError::from_response(400, body), LlmError::Auth(_)));
    }

    #[test]
    fn test_ollama_error_string() {
        let body = r#"{"error":"model 'mistral' not found"}"#;
        match LlmError::from_response(404, body) {
            LlmError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'mistral' not found");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_message() {
        match LlmError::from_response(502, "  ") {
            LlmError::Api { message, .. } => assert_eq!(message, "HTTP 502"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_body_errors() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let decode = reqwest::get(server.uri())
            .await
            .unwrap()
            .json::<Value>()
            .await
            .unwrap_err();
        assert!(matches!(
            LlmError::from_body(200, decode),
            LlmError::Api { status: 200, .. }
        ));

        let refused = reqwest::get("http://127.0.0.1:1").await.unwrap_err();
        assert!(matches!(
            LlmError::from_body(200, refused),
            LlmError::Unreachable(_)
        ));
    }
}
