//! Pipeline failures and the report handed to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm::LlmError;

/// Where a request is in its single pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Received,
    Extracting,
    Anonymizing,
    Structuring,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Extracting => "extracting",
            Self::Anonymizing => "anonymizing",
            Self::Structuring => "structuring",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Machine-checkable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ExtractionFailed,
    AuthFailed,
    QuotaExhausted,
    StructuringParseFailed,
    StructuringMalformed,
    BackendUnreachable,
    BackendFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractionFailed => "ExtractionFailed",
            Self::AuthFailed => "AuthFailed",
            Self::QuotaExhausted => "QuotaExhausted",
            Self::StructuringParseFailed => "StructuringParseFailed",
            Self::StructuringMalformed => "StructuringMalformed",
            Self::BackendUnreachable => "BackendUnreachable",
            Self::BackendFailed => "BackendFailed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&LlmError> for ErrorKind {
    fn from(e: &LlmError) -> Self {
        match e {
            LlmError::MissingApiKey(_) | LlmError::Auth(_) => ErrorKind::AuthFailed,
            LlmError::Quota(_) => ErrorKind::QuotaExhausted,
            LlmError::Parse(_) => ErrorKind::StructuringParseFailed,
            LlmError::Malformed(_) => ErrorKind::StructuringMalformed,
            LlmError::Unreachable(_) => ErrorKind::BackendUnreachable,
            LlmError::Api { .. } | LlmError::Client(_) => ErrorKind::BackendFailed,
        }
    }
}

/// Terminal failure of one analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Could not read document: {0}")]
    Read(#[source] std::io::Error),

    #[error("Could not extract text: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Structuring failed: {0}")]
    Structuring(#[from] LlmError),
}

impl AnalyzeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzeError::Read(_) | AnalyzeError::Extraction(_) => ErrorKind::ExtractionFailed,
            AnalyzeError::Structuring(e) => ErrorKind::from(e),
        }
    }

    /// Stage that was running when the request failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            AnalyzeError::Read(_) | AnalyzeError::Extraction(_) => PipelineStage::Extracting,
            AnalyzeError::Structuring(_) => PipelineStage::Structuring,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            stage: self.stage(),
            message: self.to_string(),
        }
    }
}

/// Serializable failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub stage: PipelineStage,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_kinds() {
        let cases = [
            (LlmError::MissingApiKey("openai".into()), ErrorKind::AuthFailed),
            (LlmError::Auth("bad key".into()), ErrorKind::AuthFailed),
            (LlmError::Quota("429".into()), ErrorKind::QuotaExhausted),
            (LlmError::Parse("x".into()), ErrorKind::StructuringParseFailed),
            (LlmError::Malformed("summary".into()), ErrorKind::StructuringMalformed),
            (LlmError::Unreachable("refused".into()), ErrorKind::BackendUnreachable),
            (
                LlmError::Api {
                    status: 500,
                    message: "boom".into(),
                },
                ErrorKind::BackendFailed,
            ),
        ];
        for (err, kind) in cases {
            let err = AnalyzeError::from(err);
            assert_eq!(err.kind(), kind);
            assert_eq!(err.stage(), PipelineStage::Structuring);
        }
    }

    #[test]
    fn test_extraction_kind() {
        let err = AnalyzeError::from(ExtractionError::NoText);
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(err.stage(), PipelineStage::Extracting);
    }

    #[test]
    fn test_report_serialization() {
        let report = AnalyzeError::from(LlmError::Quota("limit reached".into())).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "QuotaExhausted");
        assert_eq!(json["stage"], "structuring");
        assert!(json["message"].as_str().unwrap().contains("limit reached"));
    }
}
