//! Outer validation entry point and its diagnostic record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use super::repair::DefectFlags;
use super::{recover, Recovery};

const RECEIVED_TEXT_LIMIT: usize = 100;

/// Returned by [`validate_json_output`] when no JSON object can be recovered.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{error}")]
pub struct JsonDiagnostic {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_types: Option<DefectFlags>,
    /// Character offset of the first parse failure in the cleaned text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_text: Option<String>,
}

impl JsonDiagnostic {
    fn empty_input() -> Self {
        Self {
            error: "Empty JSON string provided".to_string(),
            details: None,
            error_types: None,
            position: None,
            line: None,
            column: None,
            received_text: None,
        }
    }
}

/// Cleans, parses, repairs and extracts JSON from `raw`.
///
/// Returns the recovered object as-is (no schema healing). Unrecoverable input is
/// reported with the defect classification and the location of the first parse error.
pub fn validate_json_output(raw: &str) -> Result<Value, JsonDiagnostic> {
    if raw.trim().is_empty() {
        return Err(JsonDiagnostic::empty_input());
    }

    match recover(raw) {
        Recovery::Object { map, .. } => Ok(Value::Object(map)),
        Recovery::Failed {
            cleaned,
            defects,
            error: parse_error,
        } => {
            error!("JSON decode error: {parse_error}");
            Err(JsonDiagnostic {
                error: "Invalid JSON format".to_string(),
                details: Some(parse_error.to_string()),
                error_types: Some(defects),
                position: Some(char_offset(&cleaned, parse_error.line(), parse_error.column())),
                line: Some(parse_error.line()),
                column: Some(parse_error.column()),
                received_text: Some(excerpt(raw)),
            })
        }
    }
}

/// Converts serde_json's 1-based line / byte column into a character offset.
fn char_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut byte = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(byte) {
        byte -= 1;
    }
    text[..byte].chars().count()
}

fn excerpt(raw: &str) -> String {
    if raw.chars().count() > RECEIVED_TEXT_LIMIT {
        let head: String = raw.chars().take(RECEIVED_TEXT_LIMIT).collect();
        format!("{head}...")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_json_passes_through_without_healing() {
        let value = validate_json_output(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_repairable_json_is_returned() {
        let value = validate_json_output("```json\n{'a': True,}\n```").unwrap();
        assert_eq!(value, json!({"a": true}));
    }

    #[test]
    fn test_empty_input_diagnostic() {
        for raw in ["", "   \n", "\t"] {
            let diag = validate_json_output(raw).unwrap_err();
            assert_eq!(diag.error, "Empty JSON string provided");
            let value = serde_json::to_value(&diag).unwrap();
            assert_eq!(value, json!({"error": "Empty JSON string provided"}));
        }
    }

    #[test]
    fn test_plain_text_diagnostic_shape() {
        let diag = validate_json_output("hello world").unwrap_err();
        assert_eq!(diag.error, "Invalid JSON format");
        assert_eq!(diag.line, Some(1));
        assert_eq!(diag.received_text.as_deref(), Some("hello world"));
        assert!(diag.details.is_some());

        let value = serde_json::to_value(&diag).unwrap();
        for key in [
            "error",
            "details",
            "error_types",
            "position",
            "line",
            "column",
            "received_text",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_received_text_is_truncated() {
        let raw = "x".repeat(150);
        let diag = validate_json_output(&raw).unwrap_err();
        let received = diag.received_text.unwrap();
        assert_eq!(received.len(), 103);
        assert!(received.ends_with("..."));
    }

    #[test]
    fn test_char_offset_multiline() {
        let text = "ab\ncdé\nf";
        assert_eq!(char_offset(text, 1, 1), 0);
        assert_eq!(char_offset(text, 2, 2), 4);
        assert_eq!(char_offset(text, 3, 1), 7);
    }

    #[test]
    fn test_diagnostic_reports_position_of_failure() {
        let diag = validate_json_output("{\"a\": 1\n\"b\" ??? }").unwrap_err();
        assert_eq!(diag.line, Some(2));
        assert!(diag.position.unwrap() >= 8);
    }
}
