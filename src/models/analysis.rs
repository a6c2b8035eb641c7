//! Structured analysis output handed back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three fields a structuring backend produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    pub summary: String,
    pub key_points: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Metadata assembled by the pipeline once structuring succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Character count of the extracted text, before anonymization and truncation.
    pub text_length: usize,
    /// When the analysis completed (serialized as RFC 3339).
    pub analysis_date: DateTime<Utc>,
    /// Model identifier of the backend that produced the summary.
    pub model: String,
}

/// Final result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub suggestions: Vec<String>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn new(structured: StructuredSummary, metadata: AnalysisMetadata) -> Self {
        Self {
            summary: structured.summary,
            key_points: structured.key_points,
            suggestions: structured.suggestions,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let date = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let result = AnalysisResult::new(
            StructuredSummary {
                summary: "Résumé".to_string(),
                key_points: vec!["un".to_string()],
                suggestions: vec!["deux".to_string()],
            },
            AnalysisMetadata {
                text_length: 42,
                analysis_date: date,
                model: "gpt-4".to_string(),
            },
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["keyPoints"][0], "un");
        assert_eq!(json["metadata"]["textLength"], 42);
        assert_eq!(json["metadata"]["model"], "gpt-4");
        assert!(json["metadata"]["analysisDate"]
            .as_str()
            .unwrap()
            .starts_with("2024-03-15T10:00:00"));
    }
}
