//! Document analysis pipeline.
//!
//! One request is a straight line through
//! `received -> extracting -> anonymizing -> structuring -> completed`;
//! any error ends the request as `failed`. Stages are never re-entered and
//! nothing is retried. The source file is deleted on every exit path.
//!
//! One deadline bounds extraction and structuring together. Running out of
//! time while extracting is an extraction failure; while waiting on the
//! backend it is an unreachable backend.

mod cleanup;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::anonymize::Anonymizer;
use crate::extract::{ExtractionError, TextExtractor};
use crate::llm::{LlmError, Structurer};
use crate::models::{AnalysisMetadata, AnalysisResult, RawDocument};

pub use cleanup::UploadGuard;
pub use error::{AnalyzeError, ErrorKind, ErrorReport, PipelineStage};

/// End-to-end bound on one analysis.
pub const DEFAULT_ANALYZE_TIMEOUT: Duration = Duration::from_secs(120);

/// Extraction, anonymization and structuring for one document at a time.
///
/// Holds only immutable configuration; clone it freely and run analyses
/// concurrently.
#[derive(Clone)]
pub struct Pipeline {
    extractor: TextExtractor,
    anonymizer: Anonymizer,
    structurer: Arc<dyn Structurer>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        extractor: TextExtractor,
        anonymizer: Anonymizer,
        structurer: Arc<dyn Structurer>,
    ) -> Self {
        Self {
            extractor,
            anonymizer,
            structurer,
            timeout: DEFAULT_ANALYZE_TIMEOUT,
        }
    }

    /// Bound the whole analysis, extraction and backend call included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn structurer(&self) -> &Arc<dyn Structurer> {
        &self.structurer
    }

    /// Analyze the file at `path`, taking ownership of it.
    ///
    /// The file is removed before this returns, whether the analysis
    /// succeeded or failed.
    pub async fn analyze(&self, path: impl AsRef<Path>) -> Result<AnalysisResult, AnalyzeError> {
        let guard = UploadGuard::new(path.as_ref());
        let outcome = self.run(guard.path()).await;
        guard.release().await;

        match outcome {
            Ok(result) => {
                info!(
                    "Stage {}: {} key points, {} suggestions",
                    PipelineStage::Completed,
                    result.key_points.len(),
                    result.suggestions.len()
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "Stage {} during {} ({}): {}",
                    PipelineStage::Failed,
                    e.stage(),
                    e.kind(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run(&self, path: &Path) -> Result<AnalysisResult, AnalyzeError> {
        let deadline = Instant::now() + self.timeout;
        info!("Stage {}: {}", PipelineStage::Received, path.display());

        info!("Stage {}", PipelineStage::Extracting);
        let document = RawDocument::read(path).await.map_err(AnalyzeError::Read)?;
        debug!(
            "Document {} ({}, {} bytes)",
            document.fingerprint(),
            document.media_type(),
            document.len()
        );
        let extracted = timeout_at(deadline, self.extractor.extract(&document))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))??;
        drop(document);
        let text_length = extracted.char_len();
        debug!("Extracted {} chars", text_length);

        info!("Stage {}", PipelineStage::Anonymizing);
        let sanitized = self.anonymizer.anonymize(&extracted);
        drop(extracted);
        debug!("Applied {} redactions", sanitized.total_redactions());

        info!(
            "Stage {}: model {}",
            PipelineStage::Structuring,
            self.structurer.model_id()
        );
        let structured = timeout_at(deadline, self.structurer.structure(sanitized.as_str()))
            .await
            .map_err(|_| {
                LlmError::Unreachable(format!("no response within {:?}", self.timeout))
            })??;

        let metadata = AnalysisMetadata {
            text_length,
            analysis_date: Utc::now(),
            model: self.structurer.model_id().to_string(),
        };
        Ok(AnalysisResult::new(structured, metadata))
    }
}
