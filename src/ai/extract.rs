//! JSON Extraction from Model Output
//!
//! Models asked for "JSON only" still wrap payloads in prose or code fences
//! often enough that downstream parsing cannot assume a clean body. Recovery
//! works on the smallest-valid-candidate principle:
//!
//! 1. Strip leading/trailing code-fence markers (with or without a language
//!    tag, any case).
//! 2. Collect every non-overlapping brace- or bracket-delimited block in a
//!    single non-greedy regex pass.
//! 3. Parse each candidate; among those that parse to an object or array,
//!    keep the shortest - the tightest candidate is the intended payload
//!    rather than an accidental superset match.
//! 4. If nothing parsed, retry the first candidate verbatim, then the
//!    original trimmed text (covers nested objects the non-greedy pass
//!    truncates).
//!
//! Only when every attempt fails does the operation fail, with
//! `json_parse_error`. Never panics, whatever the input.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::types::error::excerpt;
use crate::types::{AutopressError, Result};

static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}|\[.*?\]").expect("candidate pattern is valid"));

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*```[a-z0-9_+-]*[ \t]*\r?\n?").expect("fence-open pattern is valid")
});

static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?[ \t]*```\s*$").expect("fence-close pattern is valid"));

/// Extract the intended JSON payload from raw model output.
pub fn extract_json(content: &str) -> Result<Value> {
    let stripped = strip_code_fences(content);

    let candidates: Vec<&str> = CANDIDATE
        .find_iter(&stripped)
        .map(|m| m.as_str())
        .collect();

    let shortest = candidates
        .iter()
        .filter_map(|candidate| {
            serde_json::from_str::<Value>(candidate)
                .ok()
                .filter(|value| value.is_object() || value.is_array())
                .map(|value| (candidate.len(), value))
        })
        .min_by_key(|(len, _)| *len);

    if let Some((_, value)) = shortest {
        return Ok(value);
    }

    // No candidate parsed on its own. The first candidate verbatim, then the
    // whole trimmed text: nested objects defeat the non-greedy pass but parse
    // fine when the response was pure JSON to begin with.
    if let Some(first) = candidates.first()
        && let Ok(value) = serde_json::from_str::<Value>(first)
    {
        return Ok(value);
    }

    match serde_json::from_str::<Value>(&stripped) {
        Ok(value) => Ok(value),
        Err(err) => {
            debug!("No JSON candidate parsed: {err}");
            Err(AutopressError::JsonParse(format!(
                "no parseable JSON in model output (preview: {})",
                excerpt(&stripped, 120)
            )))
        }
    }
}

/// Remove a leading and trailing markdown code fence, language tag included.
fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let without_open = FENCE_OPEN.replace(trimmed, "");
    let without_close = FENCE_CLOSE.replace(&without_open, "");
    without_close.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bare_json() {
        let value = extract_json(r#"{"title": "Hello"}"#).unwrap();
        assert_eq!(value["title"], "Hello");
    }

    #[test]
    fn test_fenced_json() {
        let value = extract_json("```json\n{\"title\": \"Hello\"}\n```").unwrap();
        assert_eq!(value["title"], "Hello");
    }

    #[test]
    fn test_fenced_json_uppercase_tag() {
        let value = extract_json("```JSON\n{\"title\": \"Hello\"}\n```").unwrap();
        assert_eq!(value["title"], "Hello");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let value = extract_json("```\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let input = r#"Sure! Here is the article you asked for:
{"title": "Hello", "tags": "a, b"}
Let me know if you need anything else."#;
        let value = extract_json(input).unwrap();
        assert_eq!(value["title"], "Hello");
    }

    #[test]
    fn test_shortest_candidate_wins() {
        let input = r#"{"a": 1} ignore this {"b": 2, "c": 3, "d": 4}"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_nested_object_falls_back_to_full_text() {
        let input = r#"{"outer": {"inner": 1}}"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value["outer"]["inner"], 1);
    }

    #[test]
    fn test_array_payload() {
        let value = extract_json(r#"["a", "b"]"#).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_no_valid_json_is_parse_error() {
        let err = extract_json("there is no json here").unwrap_err();
        assert_eq!(err.kind(), "json_parse_error");

        let err = extract_json("{broken").unwrap_err();
        assert_eq!(err.kind(), "json_parse_error");
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert_eq!(extract_json("").unwrap_err().kind(), "json_parse_error");
        assert_eq!(extract_json("   ").unwrap_err().kind(), "json_parse_error");
    }

    proptest! {
        #[test]
        fn extraction_never_panics(input in "\\PC*") {
            let _ = extract_json(&input);
        }

        #[test]
        fn valid_objects_always_recovered(key in "[a-z]{1,8}", n in 0i64..1000) {
            let payload = format!("{{\"{key}\": {n}}}");
            let value = extract_json(&payload).unwrap();
            prop_assert_eq!(&value[&key], n);
        }
    }
}
