//! Configuration management for pdf-analyzer using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::anonymize::{Anonymizer, Category};
use crate::extract::{TextExtractor, DEFAULT_PDFTOTEXT};
use crate::llm::LlmConfig;
use crate::upload::{default_accepted_types, default_upload_dir, UploadPolicy, DEFAULT_MAX_FILE_SIZE};

/// Text extraction settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct ExtractConfig {
    /// Path or name of the pdftotext binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftotext: Option<String>,
}

/// Anonymization settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct AnonymizeConfig {
    /// Redaction passes to disable (e.g. `["name", "medical"]`).
    #[serde(default)]
    #[prefer(default)]
    pub skip: Vec<String>,
}

impl AnonymizeConfig {
    /// Parsed categories; unknown names are logged and ignored.
    pub fn skipped_categories(&self) -> Vec<Category> {
        self.skip
            .iter()
            .filter_map(|name| {
                let category = Category::from_str(name);
                if category.is_none() {
                    warn!("Ignoring unknown anonymization pass: {}", name);
                }
                category
            })
            .collect()
    }
}

/// Upload intake settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// Accepted media types; empty means the defaults.
    #[serde(default)]
    #[prefer(default)]
    pub accepted_types: Vec<String>,
    /// Directory staged uploads are copied into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Structuring backend.
    #[serde(default)]
    #[prefer(default)]
    pub llm: LlmConfig,
    /// Text extraction.
    #[serde(default)]
    #[prefer(default)]
    pub extract: ExtractConfig,
    /// Redaction passes.
    #[serde(default)]
    #[prefer(default)]
    pub anonymize: AnonymizeConfig,
    /// Upload intake.
    #[serde(default)]
    #[prefer(default)]
    pub upload: UploadConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers pdf-analyzer config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("pdf-analyzer").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}; using defaults", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            // No config file found, use defaults with env overrides
            Err(_) => Self::default_with_env(),
        }
    }

    /// Load from an explicit path if given, otherwise discover.
    pub async fn load_with_path(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::load().await),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Apply environment variable overrides.
    ///
    /// LLM variables are documented on [`LlmConfig::with_env_overrides`];
    /// `MAX_FILE_SIZE` sets the upload limit in bytes.
    pub fn with_env_overrides(mut self) -> Self {
        self.llm = self.llm.with_env_overrides();
        if let Some(n) = std::env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.upload.max_file_size = Some(n);
        }
        self
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        let upload_dir = match self.upload.upload_dir {
            Some(ref dir) => {
                let base = self
                    .base_dir()
                    .or_else(|| std::env::current_dir().ok())
                    .unwrap_or_default();
                self.resolve_path(dir, &base)
            }
            None => default_upload_dir(),
        };
        let accepted_types = if self.upload.accepted_types.is_empty() {
            default_accepted_types()
        } else {
            self.upload.accepted_types.clone()
        };

        UploadPolicy {
            max_file_size: self.upload.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            accepted_types,
            upload_dir,
        }
    }

    /// Extractor bounded by the same timeout as the backend call.
    pub fn extractor(&self) -> TextExtractor {
        let extractor =
            TextExtractor::new().with_timeout(Duration::from_secs(self.llm.timeout_secs));
        match self.extract.pdftotext {
            Some(ref binary) => extractor.with_pdftotext(binary.as_str()),
            None => extractor,
        }
    }

    pub fn anonymizer(&self) -> Anonymizer {
        Anonymizer::without(&self.anonymize.skipped_categories())
    }

    /// Fully resolved settings with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let policy = self.upload_policy();
        let llm = self.llm.redacted();
        Self {
            llm: LlmConfig {
                endpoint: Some(llm.effective_endpoint()),
                model: Some(llm.effective_model().to_string()),
                ..llm
            },
            extract: ExtractConfig {
                pdftotext: Some(
                    self.extract
                        .pdftotext
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PDFTOTEXT.to_string()),
                ),
            },
            anonymize: self.anonymize.clone(),
            upload: UploadConfig {
                max_file_size: Some(policy.max_file_size),
                accepted_types: policy.accepted_types,
                upload_dir: Some(policy.upload_dir.display().to_string()),
            },
            source_path: self.source_path.clone(),
        }
    }
}
