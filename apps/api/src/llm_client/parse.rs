//! Staged JSON extraction for model replies.
//!
//! 1. `parse_strict`: the whole reply is JSON.
//! 2. `extract_fenced`: the JSON sits inside a ```json / ``` block, possibly
//!    surrounded by prose, which is discarded.
//! 3. The caller turns any remaining error into its fallback value.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::LlmError;

pub fn parse_strict<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(text.trim())
}

/// Returns the body of the first fenced code block, or `None` if there is no fence.
/// A missing closing fence takes everything after the opening one.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let after_open = match text.find("```json") {
        Some(idx) => &text[idx + "```json".len()..],
        None => {
            let idx = text.find("```")?;
            // Skip an info string such as ```JSON or ```javascript
            text[idx + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        }
    };
    let body = match after_open.find("```") {
        Some(end) => &after_open[..end],
        None => after_open,
    };
    let body = body.trim();
    (!body.is_empty()).then_some(body)
}

/// Runs the strict and fenced stages in order.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    let strict_err = match parse_strict(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    match extract_fenced(text) {
        Some(body) => parse_strict(body).map_err(LlmError::Parse),
        None => Err(LlmError::Parse(strict_err)),
    }
}

/// Parses a match reply, which must be a JSON object.
pub fn parse_match_reply(text: &str) -> Result<Map<String, Value>, LlmError> {
    match parse_json_reply::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::UnexpectedShape(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_fenced(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_fenced_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_fenced(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_fenced_no_fences() {
        assert_eq!(extract_fenced("{\"key\": \"value\"}"), None);
    }

    #[test]
    fn test_extract_fenced_drops_surrounding_prose() {
        let input = "Here is my analysis:\n```json\n{\"score\": 72}\n```\nLet me know if you need more.";
        assert_eq!(extract_fenced(input), Some("{\"score\": 72}"));
    }

    #[test]
    fn test_extract_fenced_other_info_string() {
        let input = "```JSON\n{\"a\": 1}\n```";
        assert_eq!(extract_fenced(input), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_fenced_unterminated() {
        let input = "```json\n{\"a\": 1}";
        assert_eq!(extract_fenced(input), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_parse_match_reply_plain_object() {
        let map = parse_match_reply("{\"score\": 80, \"summary\": \"fine\"}").unwrap();
        assert_eq!(map.get("score").and_then(Value::as_i64), Some(80));
    }

    #[test]
    fn test_parse_match_reply_fenced_object() {
        let reply = "Sure!\n```json\n{\"score\": 72, \"match_level\": \"Good\"}\n```";
        let map = parse_match_reply(reply).unwrap();
        assert_eq!(map.get("match_level").and_then(Value::as_str), Some("Good"));
    }

    #[test]
    fn test_parse_match_reply_rejects_non_object() {
        let err = parse_match_reply("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedShape(_)));
    }

    #[test]
    fn test_parse_match_reply_rejects_prose() {
        let err = parse_match_reply("The candidate looks great, 9/10.").unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_parse_match_reply_empty_is_empty_content() {
        let err = parse_match_reply("   ").unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
