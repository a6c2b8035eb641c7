//! Turning raw model output into a validated [`StructuredSummary`].
//!
//! Models often wrap the requested JSON in prose or code fences. Parsing
//! first tries the whole reply, then the first balanced `{...}` block.

use serde_json::{Map, Value};

use super::LlmError;
use crate::models::StructuredSummary;

/// Parse and validate a model reply.
pub fn parse_summary(raw: &str) -> Result<StructuredSummary, LlmError> {
    let value = parse_json(raw)?;
    validate(&value)
}

fn parse_json(raw: &str) -> Result<Value, LlmError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::Parse("empty response".to_string()));
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let block = first_json_object(trimmed)
        .ok_or_else(|| LlmError::Parse("no JSON object found in response".to_string()))?;
    serde_json::from_str(block).map_err(|e| LlmError::Parse(format!("embedded object: {}", e)))
}

/// Locate the first balanced `{...}` block, skipping braces inside strings.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate(value: &Value) -> Result<StructuredSummary, LlmError> {
    let obj = value
        .as_object()
        .ok_or_else(|| LlmError::Malformed("response is not a JSON object".to_string()))?;

    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let key_points = list_field(obj, &["keyPoints", "key_points"]);
    let suggestions = list_field(obj, &["suggestions"]);

    let mut missing = Vec::new();
    if summary.is_none() {
        missing.push("summary");
    }
    if key_points.is_empty() {
        missing.push("keyPoints");
    }
    if suggestions.is_empty() {
        missing.push("suggestions");
    }

    match summary {
        Some(summary) if missing.is_empty() => Ok(StructuredSummary {
            summary,
            key_points,
            suggestions,
        }),
        _ => Err(LlmError::Malformed(missing.join(", "))),
    }
}

/// Read a list field; a lone scalar becomes a one-element list and blank
/// entries are dropped.
fn list_field(obj: &Map<String, Value>, names: &[&str]) -> Vec<String> {
    let Some(value) = names.iter().find_map(|name| obj.get(*name)) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items.iter().filter_map(item_text).collect(),
        other => item_text(other).into_iter().collect(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"{"summary":"Un contrat de bail.","keyPoints":["Durée 3 ans","Loyer mensuel"],"suggestions":["Vérifier la clause de résiliation"]}"#;

    #[test]
    fn test_clean_json() {
        let summary = parse_summary(CLEAN).unwrap();
        assert_eq!(summary.summary, "Un contrat de bail.");
        assert_eq!(summary.key_points, vec!["Durée 3 ans", "Loyer mensuel"]);
        assert_eq!(summary.suggestions.len(), 1);
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let raw = format!("Voici l'analyse demandée :\n```json\n{}\n```\nBonne lecture !", CLEAN);
        let summary = parse_summary(&raw).unwrap();
        assert_eq!(summary.key_points.len(), 2);
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"Réponse: {"summary":"Accolade } dans le texte \" et {","keyPoints":["a"],"suggestions":["b"]} fin {"#;
        let summary = parse_summary(raw).unwrap();
        assert_eq!(summary.summary, "Accolade } dans le texte \" et {");
    }

    #[test]
    fn test_first_object_wins() {
        let raw = r#"{"summary":"premier","keyPoints":["a"],"suggestions":["b"]} puis {"summary":"second"}"#;
        assert_eq!(parse_summary(raw).unwrap().summary, "premier");
    }

    #[test]
    fn test_no_json_is_parse_error() {
        let err = parse_summary("Je ne peux pas analyser ce document.").unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_unbalanced_is_parse_error() {
        let err = parse_summary(r#"Voici: {"summary": "coupé"#).unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_empty_reply_is_parse_error() {
        assert!(matches!(parse_summary("  \n").unwrap_err(), LlmError::Parse(_)));
    }

    #[test]
    fn test_scalars_become_lists() {
        let raw = r#"{"summary":"S","keyPoints":"un seul point","suggestions":"une suggestion"}"#;
        let summary = parse_summary(raw).unwrap();
        assert_eq!(summary.key_points, vec!["un seul point"]);
        assert_eq!(summary.suggestions, vec!["une suggestion"]);
    }

    #[test]
    fn test_blank_items_dropped() {
        let raw = r#"{"summary":"S","keyPoints":["a", "", null, "  "],"suggestions":[3]}"#;
        let summary = parse_summary(raw).unwrap();
        assert_eq!(summary.key_points, vec!["a"]);
        assert_eq!(summary.suggestions, vec!["3"]);
    }

    #[test]
    fn test_snake_case_key_points_accepted() {
        let raw = r#"{"summary":"S","key_points":["a"],"suggestions":["b"]}"#;
        assert_eq!(parse_summary(raw).unwrap().key_points, vec!["a"]);
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let raw = r#"{"summary":"S","keyPoints":[]}"#;
        match parse_summary(raw).unwrap_err() {
            LlmError::Malformed(msg) => assert_eq!(msg, "keyPoints, suggestions"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_summary_is_malformed() {
        let raw = r#"{"summary":"   ","keyPoints":["a"],"suggestions":["b"]}"#;
        assert!(matches!(parse_summary(raw).unwrap_err(), LlmError::Malformed(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(parse_summary("[1, 2]").unwrap_err(), LlmError::Malformed(_)));
    }
}
