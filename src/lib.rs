//! pdf-analyzer - document analysis with anonymization.
//!
//! Extracts text from an uploaded PDF or text file, redacts personal data
//! with ordered pattern passes, and asks a language model (OpenAI-compatible
//! API or a local Ollama server) for a structured French summary.

pub mod anonymize;
pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod upload;

pub use pipeline::{AnalyzeError, ErrorKind, Pipeline};
