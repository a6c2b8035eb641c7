//! Structuring backend configuration.
//!
//! Values come from the config file and are then overridden by environment
//! variables (see [`LlmConfig::with_env_overrides`]). The resolved config is
//! passed explicitly into the backend constructors; nothing reads the
//! environment mid-request.

use serde::{Deserialize, Serialize};

/// Which backend serves structuring requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible cloud completion API (default)
    #[default]
    OpenAI,
    /// Ollama local inference server
    Ollama,
}

impl prefer::FromValue for LlmProvider {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(s) => LlmProvider::from_str(s).ok_or_else(|| prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: format!("unknown provider: {}", s).into(),
            }),
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "LlmProvider".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "cloud" => Some(Self::OpenAI),
            "ollama" | "local" | "mistral" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4",
            Self::Ollama => "mistral",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the structuring client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmConfig {
    /// Backend provider (openai or ollama)
    #[serde(default)]
    #[prefer(default)]
    pub provider: LlmProvider,
    /// API endpoint; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub endpoint: Option<String>,
    /// API key (required for openai, optional for ollama behind a proxy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub api_key: Option<String>,
    /// Model name; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub model: Option<String>,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    #[prefer(default)]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    #[prefer(default)]
    pub temperature: f64,
    /// Maximum characters of document content sent to the model
    #[serde(default = "default_max_content_chars")]
    #[prefer(default)]
    pub max_content_chars: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[prefer(default)]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_content_chars() -> usize {
    8000
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: None,
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "openai" (default) or "ollama"
    /// - `LLM_ENDPOINT`: API endpoint (wins over provider-specific variables)
    /// - `OLLAMA_BASE_URL`: Ollama endpoint, used when the provider is ollama
    /// - `LLM_API_KEY`: API key (wins over `OPENAI_API_KEY`)
    /// - `OPENAI_API_KEY`: API key, used when the provider is openai
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_MAX_CONTENT_CHARS`: Max document chars to send
    /// - `LLM_TIMEOUT_SECS`: HTTP request timeout
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER").and_then(|v| LlmProvider::from_str(&v)) {
            self.provider = provider;
        }
        self = self.with_provider_overrides(&lookup);

        if let Some(model) = lookup("LLM_MODEL") {
            self.model = Some(model);
        }
        if let Some(n) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = n;
        }
        if let Some(t) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(n) = lookup("LLM_MAX_CONTENT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_content_chars = n;
        }
        if let Some(n) = lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = n;
        }
        self
    }

    /// Apply only the endpoint and key variables, for the current provider.
    ///
    /// Used again after the provider changes, since `OLLAMA_BASE_URL` and
    /// `OPENAI_API_KEY` are only read for their own provider.
    pub fn with_provider_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Explicit endpoint always wins
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            self.endpoint = Some(endpoint);
        } else if self.provider == LlmProvider::Ollama {
            if let Some(endpoint) = lookup("OLLAMA_BASE_URL") {
                self.endpoint = Some(endpoint);
            }
        }

        // Explicit API key always wins
        if let Some(key) = lookup("LLM_API_KEY") {
            self.api_key = Some(key);
        } else if self.provider == LlmProvider::OpenAI && self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY");
        }
        self
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Endpoint without a trailing slash, falling back to the provider default.
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or(self.provider.default_endpoint())
            .trim_end_matches('/')
            .to_string()
    }

    /// Model name, falling back to the provider default.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(ref key) = config.api_key {
            let visible: String = key.chars().take(4).collect();
            config.api_key = Some(format!("{}…", visible));
        }
        config
    }
}
