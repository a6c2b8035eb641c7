//! Non-empty extracted text.

/// Trimmed text pulled out of a document. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedText {
    text: String,
    char_len: usize,
}

impl ExtractedText {
    /// Trim `raw` and wrap it, or return `None` if nothing remains.
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            char_len: text.chars().count(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Debug for ExtractedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedText")
            .field("char_len", &self.char_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank() {
        assert!(ExtractedText::new("").is_none());
        assert!(ExtractedText::new(" \n\t\r\n ").is_none());
    }

    #[test]
    fn test_trims_and_counts_chars() {
        let text = ExtractedText::new("  Été 2024\n").unwrap();
        assert_eq!(text.as_str(), "Été 2024");
        assert_eq!(text.char_len(), 8);
    }
}
