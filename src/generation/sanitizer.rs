//! Recovering flashcards from free-form model output.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::flashcards::{FlashcardRecord, GeneratedCard, BACK_KEY, FRONT_KEY};

/// How strictly generated elements are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizePolicy {
    /// Pass objects through untouched; packaging interprets their keys
    Lenient,
    /// Only keep elements that form a complete front/back record
    Strict,
}

fn json_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\s*\{[\s\S]*?\}\s*\]").expect("JSON array pattern is valid"))
}

/// Find the first span of `text` that looks like an array of objects and
/// parses as JSON.
///
/// Candidates are tried left to right. Matching is non-greedy, so an array
/// whose objects contain `}]` inside a string can be cut short; such a span
/// fails to parse and the next candidate is tried.
pub fn extract_valid_json(text: &str) -> Result<Value> {
    for candidate in json_array_regex().find_iter(text) {
        match serde_json::from_str::<Value>(candidate.as_str()) {
            Ok(value) if value.is_array() || value.is_object() => return Ok(value),
            Ok(_) => continue,
            Err(e) => log::debug!("Skipping unparsable JSON candidate: {}", e),
        }
    }

    Err(PipelineError::NoValidJson)
}

/// Turn parsed model output into generated cards according to `policy`.
pub fn sanitize(value: Value, policy: SanitizePolicy) -> Vec<GeneratedCard> {
    let elements = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    };

    match policy {
        SanitizePolicy::Lenient => elements
            .into_iter()
            .filter_map(|element| match element {
                Value::Object(map) => Some(GeneratedCard::Raw(map)),
                _ => None,
            })
            .collect(),
        SanitizePolicy::Strict => sanitize_records(&elements)
            .into_iter()
            .map(GeneratedCard::Record)
            .collect(),
    }
}

/// Pair front and back values across elements.
///
/// A side may arrive in its own element; the pending pair is materialised as
/// soon as both sides are present and then cleared whatever the outcome.
fn sanitize_records(elements: &[Value]) -> Vec<FlashcardRecord> {
    let mut records = Vec::new();
    let mut pending_front: Option<&Value> = None;
    let mut pending_back: Option<&Value> = None;

    for element in elements {
        let Some(map) = element.as_object() else {
            continue;
        };

        if let Some(front) = map.get(FRONT_KEY) {
            pending_front = Some(front);
        }
        if let Some(back) = map.get(BACK_KEY) {
            pending_back = Some(back);
        }

        if let (Some(front), Some(back)) = (pending_front, pending_back) {
            match FlashcardRecord::from_values(front, back) {
                Some(record) => records.push(record),
                None => log::debug!("Dropping malformed card: {} / {}", front, back),
            }
            pending_front = None;
            pending_back = None;
        }
    }

    records
}

/// Extract and sanitize one model response.
pub fn parse_response(text: &str, policy: SanitizePolicy) -> Result<Vec<GeneratedCard>> {
    let value = extract_valid_json(text)?;
    Ok(sanitize(value, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(front: &[&str], back: &[&str]) -> GeneratedCard {
        GeneratedCard::Record(FlashcardRecord {
            front: front.iter().map(|s| s.to_string()).collect(),
            back: back.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_extracts_array_from_prose() {
        let text = "Sure! Here you go:\n```json\n[ {\"a\": 1}, {\"b\": 2} ]\n```\nEnjoy.";
        assert_eq!(extract_valid_json(text).unwrap(), json!([{"a": 1}, {"b": 2}]));
    }

    #[test]
    fn test_skips_invalid_candidate() {
        let text = r#"Draft: [{"a": oops}] Final: [{"a": 1}]"#;
        assert_eq!(extract_valid_json(text).unwrap(), json!([{"a": 1}]));
    }

    #[test]
    fn test_no_candidate_is_error() {
        assert!(matches!(extract_valid_json("no json here"), Err(PipelineError::NoValidJson)));
        assert!(matches!(extract_valid_json(r#"{"a": 1}"#), Err(PipelineError::NoValidJson)));
        assert!(matches!(extract_valid_json("[1, 2, 3]"), Err(PipelineError::NoValidJson)));
    }

    #[test]
    fn test_lenient_passes_objects_through() {
        let value = json!([{"whatever_anverso": ["Q"]}, 7, {"x": "y"}]);
        let cards = sanitize(value, SanitizePolicy::Lenient);
        assert_eq!(cards.len(), 2);
        assert!(matches!(&cards[0], GeneratedCard::Raw(map) if map.contains_key("whatever_anverso")));
    }

    #[test]
    fn test_strict_pairs_split_elements() {
        let value = json!([
            {"campos_anverso": ["Q"]},
            {"campo_reverso": ["A"]},
            {"campos_anverso": ["Q2"]}
        ]);
        assert_eq!(sanitize(value, SanitizePolicy::Strict), vec![record(&["Q"], &["A"])]);
    }

    #[test]
    fn test_strict_accepts_both_keys_in_one_element() {
        let value = json!([
            {"campos_anverso": ["Q1", "Hint"], "campo_reverso": ["A1"]},
            {"campos_anverso": "Q2", "campo_reverso": "A2"}
        ]);
        assert_eq!(
            sanitize(value, SanitizePolicy::Strict),
            vec![record(&["Q1", "Hint"], &["A1"]), record(&["Q2"], &["A2"])]
        );
    }

    #[test]
    fn test_strict_malformed_record_does_not_leak() {
        let value = json!([
            {"campos_anverso": [1, 2], "campo_reverso": ["A"]},
            {"campo_reverso": ["orphan"]},
            {"campos_anverso": []},
            {"campos_anverso": ["Q"], "campo_reverso": ["A"]}
        ]);
        // The orphan back pairs with the empty front and is dropped with it
        assert_eq!(sanitize(value, SanitizePolicy::Strict), vec![record(&["Q"], &["A"])]);
    }

    #[test]
    fn test_parse_response_strict() {
        let text = r#"[{"campos_anverso": ["What is 2+2?"], "campo_reverso": ["4"]}] trailing"#;
        let cards = parse_response(text, SanitizePolicy::Strict).unwrap();
        assert_eq!(cards, vec![record(&["What is 2+2?"], &["4"])]);
    }
}
