//! Text extraction from uploaded documents.
//!
//! PDFs go through `pdftotext` (Poppler); plain text is decoded directly.
//! Extraction either yields non-empty text or fails: an empty document is
//! never reported as success.

mod extractor;
mod text;

pub use extractor::{ExtractionError, TextExtractor, DEFAULT_EXTRACT_TIMEOUT, DEFAULT_PDFTOTEXT};
pub use text::ExtractedText;
