//! Prompt templates for structured document analysis.

use std::borrow::Cow;

/// Appended to content cut at the character limit.
pub const TRUNCATION_MARKER: &str = "...";

/// System message sent with every structuring request.
pub const SYSTEM_PROMPT: &str = "Tu es un assistant spécialisé dans l'analyse de documents. Tu fournis des analyses structurées et des recommandations pratiques. Réponds toujours en français et au format JSON demandé.";

/// User message template; `{content}` is replaced with the (truncated) document text.
pub const ANALYSIS_PROMPT: &str = r#"Analyse le document suivant et fournis une réponse structurée en français au format JSON avec les sections suivantes:

1. **Résumé** (200-300 mots): Un résumé concis et bien structuré du document
2. **Points clés** (5-8 points): Les informations les plus importantes sous forme de liste
3. **Suggestions d'actions** (3-5 suggestions): Actions concrètes à entreprendre basées sur le contenu

Document à analyser:
{content}

Réponds UNIQUEMENT avec un objet JSON valide au format suivant:
{
  "summary": "résumé du document...",
  "keyPoints": [
    "point clé 1",
    "point clé 2",
    "point clé 3"
  ],
  "suggestions": [
    "suggestion 1",
    "suggestion 2",
    "suggestion 3"
  ]
}"#;

/// Keep the first `max_chars` characters of `text`, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
///
/// Counts Unicode scalar values, never splitting a character.
pub fn truncate_content(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Build the user prompt for already-truncated content.
pub fn build_analysis_prompt(content: &str) -> String {
    ANALYSIS_PROMPT.replace("{content}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        let out = truncate_content("court", 8000);
        assert!(matches!(out, Cow::Borrowed("court")));
    }

    #[test]
    fn test_exact_length_untouched() {
        let text = "a".repeat(10);
        assert_eq!(truncate_content(&text, 10), text);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let text = "éèàù".repeat(3);
        let out = truncate_content(&text, 5);
        assert_eq!(out, "éèàùé...");
    }

    #[test]
    fn test_prompt_embeds_content_once() {
        let prompt = build_analysis_prompt("CONTENU-UNIQUE");
        assert_eq!(prompt.matches("CONTENU-UNIQUE").count(), 1);
        assert!(!prompt.contains("{content}"));
        assert!(prompt.contains("\"keyPoints\""));
    }
}
