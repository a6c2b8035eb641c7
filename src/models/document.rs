//! Raw document bytes as received from the caller.
//!
//! A `RawDocument` lives only for the duration of one analysis request and is
//! dropped right after extraction.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Media type used when nothing better can be determined.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded document: opaque bytes plus the media type they are believed to have.
#[derive(Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    media_type: String,
}

impl RawDocument {
    /// Wrap bytes with a declared media type.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Wrap bytes, detecting the media type from their content.
    pub fn sniff(bytes: Vec<u8>) -> Self {
        let media_type = detect_media_type(&bytes);
        Self {
            bytes,
            media_type: media_type.to_string(),
        }
    }

    /// Read a document from disk and detect its media type.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::sniff(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short content hash for log lines. Never log the content itself.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())[..12].to_string()
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Detect a media type from magic bytes.
///
/// Content without a recognizable signature that is valid UTF-8 is treated
/// as plain text.
pub fn detect_media_type(bytes: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type();
    }
    if std::str::from_utf8(bytes).is_ok() {
        "text/plain"
    } else {
        OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_pdf() {
        let doc = RawDocument::sniff(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj".to_vec());
        assert_eq!(doc.media_type(), "application/pdf");
    }

    #[test]
    fn test_sniff_plain_text() {
        let doc = RawDocument::sniff("Bonjour à tous".as_bytes().to_vec());
        assert_eq!(doc.media_type(), "text/plain");
    }

    #[test]
    fn test_sniff_binary() {
        let doc = RawDocument::sniff(vec![0xff, 0xfe, 0x00, 0x81, 0x9f]);
        assert_eq!(doc.media_type(), OCTET_STREAM);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = RawDocument::new(b"same".to_vec(), "text/plain");
        let b = RawDocument::new(b"same".to_vec(), "application/pdf");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 12);
    }

    #[test]
    fn test_debug_hides_content() {
        let doc = RawDocument::new(b"secret@example.com".to_vec(), "text/plain");
        let debug = format!("{:?}", doc);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("len"));
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello").unwrap();

        let doc = RawDocument::read(&path).await.unwrap();
        assert_eq!(doc.bytes(), b"hello");
        assert_eq!(doc.media_type(), "text/plain");
    }
}
