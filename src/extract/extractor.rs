//! Text extraction using pdftotext for PDFs and direct decoding for text.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use super::text::ExtractedText;
use crate::models::RawDocument;

/// Default pdftotext binary name, resolved through PATH.
pub const DEFAULT_PDFTOTEXT: &str = "pdftotext";

/// How long pdftotext may run before it is killed.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("No text found in document")]
    NoText,

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::Failed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Text extractor backed by external tools.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    pdftotext: String,
    timeout: Duration,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            pdftotext: DEFAULT_PDFTOTEXT.to_string(),
            timeout: DEFAULT_EXTRACT_TIMEOUT,
        }
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pdftotext binary.
    pub fn with_pdftotext(mut self, binary: impl Into<String>) -> Self {
        self.pdftotext = binary.into();
        self
    }

    /// Bound the run time of external tools.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Extract text from a document based on its media type.
    pub async fn extract(&self, doc: &RawDocument) -> Result<ExtractedText, ExtractionError> {
        let raw = match doc.media_type() {
            "application/pdf" => self.extract_pdf(doc.bytes()).await?,
            "text/plain" => std::str::from_utf8(doc.bytes())
                .map_err(|e| ExtractionError::Failed(format!("Invalid UTF-8 text: {}", e)))?
                .to_string(),
            other => return Err(ExtractionError::UnsupportedMediaType(other.to_string())),
        };

        let text = ExtractedText::new(&raw).ok_or(ExtractionError::NoText)?;
        debug!(
            "Extracted {} characters from {} document",
            text.char_len(),
            doc.media_type()
        );
        Ok(text)
    }

    /// Run pdftotext over PDF bytes.
    ///
    /// The bytes are written to a private temp directory that is removed when
    /// this function returns.
    async fn extract_pdf(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("document.pdf");
        tokio::fs::write(&input, bytes).await?;

        self.run_pdftotext(&input).await
    }

    async fn run_pdftotext(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let mut cmd = Command::new(&self.pdftotext);
        cmd.args(["-layout", "-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output,
            Err(_) => {
                warn!("{} still running after {:?}, killed", self.pdftotext, self.timeout);
                return Err(ExtractionError::Timeout(self.timeout));
            }
        };

        handle_cmd_output(
            output,
            &format!("{} (install poppler-utils)", self.pdftotext),
            "pdftotext could not read the document",
        )
    }

    /// Check if required tools are available.
    pub fn check_tools(&self) -> Vec<(String, bool)> {
        vec![(
            self.pdftotext.clone(),
            which::which(&self.pdftotext).is_ok(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_is_trimmed() {
        let doc = RawDocument::new(b"\n  Contrat de location  \n".to_vec(), "text/plain");
        let text = TextExtractor::new().extract(&doc).await.unwrap();
        assert_eq!(text.as_str(), "Contrat de location");
    }

    #[tokio::test]
    async fn test_blank_text_fails() {
        let doc = RawDocument::new(b"   \n\n\t".to_vec(), "text/plain");
        let err = TextExtractor::new().extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[tokio::test]
    async fn test_empty_document_fails() {
        let doc = RawDocument::new(Vec::new(), "text/plain");
        let err = TextExtractor::new().extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails() {
        let doc = RawDocument::new(vec![0x66, 0x6f, 0xff, 0xfe], "text/plain");
        let err = TextExtractor::new().extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }

    #[tokio::test]
    async fn test_unsupported_media_type() {
        let doc = RawDocument::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png");
        let err = TextExtractor::new().extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedMediaType(ref t) if t == "image/png"));
    }

    #[tokio::test]
    async fn test_missing_pdftotext_binary() {
        let extractor = TextExtractor::new().with_pdftotext("pdftotext-does-not-exist-42");
        let doc = RawDocument::new(b"%PDF-1.4\n".to_vec(), "application/pdf");
        let err = extractor.extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_pdftotext_is_killed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("slow-pdftotext");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let extractor = TextExtractor::new()
            .with_pdftotext(script.to_string_lossy())
            .with_timeout(Duration::from_millis(300));
        let doc = RawDocument::new(b"%PDF-1.4\n".to_vec(), "application/pdf");

        let started = std::time::Instant::now();
        let err = extractor.extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(t) if t == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(TextExtractor::new().timeout(), DEFAULT_EXTRACT_TIMEOUT);
    }

    #[test]
    fn test_check_tools() {
        let tools = TextExtractor::new().check_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].0, "pdftotext");
    }
}
