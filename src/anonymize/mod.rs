//! Pattern-based anonymization of extracted text.
//!
//! Redaction is one-way: matched spans are replaced by category placeholders
//! and nothing linking a placeholder back to the original text is kept.
//! The anonymizer is pure and deterministic, so it can be shared freely
//! between concurrent requests.

mod patterns;

use regex::NoExpand;
use tracing::debug;

use crate::extract::ExtractedText;

pub use patterns::{pass_for, passes, Category, RedactionPass};

/// Text after all enabled redaction passes.
#[derive(Clone, PartialEq, Eq)]
pub struct SanitizedText {
    text: String,
    counts: Vec<(Category, usize)>,
}

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of replacements made by each pass that matched at least once.
    pub fn redaction_counts(&self) -> &[(Category, usize)] {
        &self.counts
    }

    pub fn total_redactions(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

impl std::fmt::Debug for SanitizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizedText")
            .field("len", &self.text.len())
            .field("counts", &self.counts)
            .finish()
    }
}

/// Applies the redaction passes in order.
#[derive(Debug, Clone, Default)]
pub struct Anonymizer {
    disabled: Vec<Category>,
}

impl Anonymizer {
    /// Anonymizer with every pass enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anonymizer with the given passes turned off.
    pub fn without(categories: &[Category]) -> Self {
        Self {
            disabled: categories.to_vec(),
        }
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        !self.disabled.contains(&category)
    }

    /// Anonymize extracted document text.
    pub fn anonymize(&self, text: &ExtractedText) -> SanitizedText {
        let sanitized = self.run(text.as_str());
        debug!(
            "Anonymized {} chars, {} redactions",
            text.char_len(),
            sanitized.total_redactions()
        );
        sanitized
    }

    /// Anonymize an arbitrary string.
    pub fn anonymize_str(&self, text: &str) -> String {
        self.run(text).into_string()
    }

    fn run(&self, text: &str) -> SanitizedText {
        let mut current = text.to_string();
        let mut counts = Vec::new();

        for pass in passes() {
            if !self.is_enabled(pass.category) {
                continue;
            }
            let (next, n) = redact(pass, &current);
            if n > 0 {
                counts.push((pass.category, n));
                current = next;
            }
        }

        SanitizedText {
            text: current,
            counts,
        }
    }
}

/// Run a single pass over `text`, ignoring pass order.
pub fn apply_pass(category: Category, text: &str) -> String {
    redact(pass_for(category), text).0
}

fn redact(pass: &RedactionPass, text: &str) -> (String, usize) {
    let n = pass.pattern.find_iter(text).count();
    if n == 0 {
        return (text.to_string(), 0);
    }
    let replaced = pass
        .pattern
        .replace_all(text, NoExpand(pass.category.placeholder()))
        .into_owned();
    (replaced, n)
}
