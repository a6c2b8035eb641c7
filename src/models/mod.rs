//! Data models shared across the analysis pipeline.

mod analysis;
mod document;

pub use analysis::{AnalysisMetadata, AnalysisResult, StructuredSummary};
pub use document::{detect_media_type, RawDocument, OCTET_STREAM};
