//! Response Normalizer: turns free-form model output into a [`MatchRecord`].
//!
//! Stages run in order and each one escalates only when the previous failed:
//!
//! 1. fence stripping, 2. boundary trimming, 3. literal normalization
//!    (together: [`clean_json_string`])
//! 4. direct parse
//! 5. structural repair ([`repair`]) and one re-parse
//! 6. balanced-span extraction over the original text
//! 7. partial salvage of the `education` section
//! 8. terminal fallback
//!
//! [`normalize`] never fails. [`validate_json_output`] is the outer entry point that
//! reports unrecoverable input as a [`diagnostic::JsonDiagnostic`] instead.

pub mod clean;
pub mod diagnostic;
pub mod extract;
pub mod record;
pub mod repair;

use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use clean::clean_json_string;
pub use diagnostic::validate_json_output;
pub use record::MatchRecord;
pub use repair::DefectFlags;

use extract::{extract_from_spans, salvage_education};
use record::{EDUCATION, PARSE_FAILURE_REASONING, SECTION_KEYS};
use repair::{apply_rules, classify_defects};

/// The stage that produced a normalization result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Repaired,
    Extracted,
    Salvaged,
    Fallback,
}

impl Stage {
    /// True when a complete JSON object was recovered.
    pub fn is_recovered(self) -> bool {
        matches!(self, Stage::Direct | Stage::Repaired | Stage::Extracted)
    }
}

/// A normalized record plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: MatchRecord,
    pub stage: Stage,
    /// Defects found in the cleaned text. Empty when the direct parse succeeded.
    pub defects: DefectFlags,
}

/// Outcome of stages 1–6, shared with [`validate_json_output`].
pub(crate) enum Recovery {
    Object {
        map: Map<String, Value>,
        stage: Stage,
        defects: DefectFlags,
    },
    Failed {
        cleaned: String,
        defects: DefectFlags,
        error: serde_json::Error,
    },
}

/// Normalizes `raw` into a schema-conformant record.
pub fn normalize(raw: &str) -> MatchRecord {
    normalize_with_report(raw).record
}

pub fn normalize_with_report(raw: &str) -> Normalized {
    if raw.trim().is_empty() {
        warn!("Match response was empty");
        return Normalized {
            record: MatchRecord::fallback(PARSE_FAILURE_REASONING),
            stage: Stage::Fallback,
            defects: DefectFlags::default(),
        };
    }

    match recover(raw) {
        Recovery::Object {
            map,
            stage: Stage::Extracted,
            defects,
        } if !has_section_key(&map) => {
            debug!("extracted object has no section keys, trying salvage");
            let (record, stage) = salvage_or_fallback(raw);
            Normalized {
                record,
                stage,
                defects,
            }
        }
        Recovery::Object {
            map,
            stage,
            defects,
        } => Normalized {
            record: MatchRecord::from_map(&map),
            stage,
            defects,
        },
        Recovery::Failed { defects, error, .. } => {
            warn!("Match response could not be parsed as JSON: {error}");
            let (record, stage) = salvage_or_fallback(raw);
            Normalized {
                record,
                stage,
                defects,
            }
        }
    }
}

pub(crate) fn recover(raw: &str) -> Recovery {
    let cleaned = clean_json_string(raw);

    let error = match parse_object(&cleaned) {
        Ok(map) => {
            return Recovery::Object {
                map,
                stage: Stage::Direct,
                defects: DefectFlags::default(),
            }
        }
        Err(e) => e,
    };
    debug!("direct parse failed: {error}");

    let defects = classify_defects(&cleaned);
    if defects.any() {
        if let Ok(map) = parse_object(&apply_rules(&cleaned, &defects)) {
            debug!(?defects, "recovered JSON after structural repair");
            return Recovery::Object {
                map,
                stage: Stage::Repaired,
                defects,
            };
        }
    }

    if let Some(map) = extract_from_spans(raw) {
        debug!("recovered JSON from a balanced span");
        return Recovery::Object {
            map,
            stage: Stage::Extracted,
            defects,
        };
    }

    Recovery::Failed {
        cleaned,
        defects,
        error,
    }
}

fn salvage_or_fallback(raw: &str) -> (MatchRecord, Stage) {
    if let Some(education) = salvage_education(raw) {
        let mut map = serde_json::to_value(MatchRecord::fallback(PARSE_FAILURE_REASONING))
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        map.insert(EDUCATION.to_string(), education);
        return (MatchRecord::from_map(&map), Stage::Salvaged);
    }

    warn!("Falling back to default match record");
    (MatchRecord::fallback(PARSE_FAILURE_REASONING), Stage::Fallback)
}

fn has_section_key(map: &Map<String, Value>) -> bool {
    SECTION_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Parses `text` as a JSON object. Arrays and scalars are rejected.
pub(crate) fn parse_object(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_json() -> Value {
        json!({
            "education": {"match_level": 6, "match_score": "80%", "reasoning": "MS in Robotics is highly relevant"},
            "work_and_project_experience": {"match_level": 5, "match_score": "75%", "reasoning": "TPM on AI products"},
            "skills": {"match_level": 5, "match_score": "70%", "reasoning": "Python, ML exposure"},
            "experience_year": {"match_level": 4, "match_score": "60%", "reasoning": "8 years, partly relevant"},
            "Final_match": {"match_level": 5, "Final_match_score": "72%", "reasoning": "Strong transferable profile"}
        })
    }

    #[test]
    fn test_valid_schema_json_is_returned_unchanged() {
        let raw = serde_json::to_string_pretty(&schema_json()).unwrap();
        let normalized = normalize_with_report(&raw);
        assert_eq!(normalized.stage, Stage::Direct);
        assert_eq!(serde_json::to_value(&normalized.record).unwrap(), schema_json());
    }

    #[test]
    fn test_fenced_json_matches_unwrapped_json() {
        let body = serde_json::to_string(&schema_json()).unwrap();
        let fenced = format!("Here is the evaluation:\n```json\n{body}\n```\nLet me know!");
        let generic = format!("```\n{body}\n```");
        assert_eq!(normalize(&fenced), normalize(&body));
        assert_eq!(normalize(&generic), normalize(&body));
    }

    #[test]
    fn test_missing_keys_are_synthesized() {
        let raw = r#"{"education": {"match_level": 6, "match_score": "80%", "reasoning": "ok"}}"#;
        let record = normalize(raw);
        assert_eq!(record.education.match_level, 6);
        for section in [
            &record.work_and_project_experience,
            &record.skills,
            &record.experience_year,
        ] {
            assert_eq!(section.match_level, 1);
            assert_eq!(section.match_score, "0%");
        }
        assert_eq!(record.final_match.final_match_score, "0%");
    }

    #[test]
    fn test_plain_text_falls_back() {
        let normalized = normalize_with_report("hello world");
        assert_eq!(normalized.stage, Stage::Fallback);
        assert_eq!(normalized.record, MatchRecord::fallback(PARSE_FAILURE_REASONING));
    }

    #[test]
    fn test_truncated_braces_are_repaired() {
        let normalized = normalize_with_report(r#"{"education": {"match_level": 5, "match_score": "65%", "reasoning": "ok""#);
        assert_eq!(normalized.stage, Stage::Repaired);
        assert!(normalized.defects.unbalanced_braces);
        assert_eq!(normalized.record.education.match_level, 5);
        assert_eq!(normalized.record.education.match_score, "65%");
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let mut raw = serde_json::to_string(&schema_json()).unwrap();
        raw.insert(raw.len() - 1, ',');
        let normalized = normalize_with_report(&raw);
        assert_eq!(normalized.stage, Stage::Repaired);
        assert_eq!(serde_json::to_value(&normalized.record).unwrap(), schema_json());
    }

    #[test]
    fn test_single_quotes_parse_like_double_quotes() {
        let double = serde_json::to_string(&schema_json()).unwrap();
        let single = double.replace('"', "'");
        assert_eq!(normalize(&single), normalize(&double));
    }

    #[test]
    fn test_python_literals_are_normalized() {
        let map = match recover("{'flag': True, 'other': False, 'nothing': None}") {
            Recovery::Object { map, stage, .. } => {
                assert_eq!(stage, Stage::Direct);
                map
            }
            Recovery::Failed { error, .. } => panic!("expected parse, got {error}"),
        };
        assert_eq!(
            Value::Object(map),
            json!({"flag": true, "other": false, "nothing": null})
        );
    }

    #[test]
    fn test_apostrophe_in_value_is_a_known_limitation() {
        let raw = r#"{"education": {"match_level": 5, "match_score": "60%", "reasoning": "candidate's degree"}}"#;
        // The stray quote breaks the outer object; extraction finds nothing whole either.
        let normalized = normalize_with_report(raw);
        assert!(!normalized.stage.is_recovered());
    }

    #[test]
    fn test_non_object_json_is_not_accepted() {
        let normalized = normalize_with_report("[1, 2, 3]");
        assert_eq!(normalized.stage, Stage::Fallback);
    }

    #[test]
    fn test_extraction_from_prose_with_stray_brace() {
        let raw = "Note: scores use {level} placeholders.\n{\"skills\": {\"match_level\": 4, \"match_score\": \"55%\", \"reasoning\": \"Rust\"}}";
        let normalized = normalize_with_report(raw);
        assert_eq!(normalized.stage, Stage::Extracted);
        assert_eq!(normalized.record.skills.match_level, 4);
    }

    #[test]
    fn test_education_is_salvaged_from_garbled_response() {
        // Education never closes, so no balanced span holds a parseable object.
        let raw = r#"{"education": {"match_level": 6, "match_score": "80%", "reasoning": "MS", "skills": {"match_level": 4 "match_score": ??? }"#;
        let normalized = normalize_with_report(raw);
        assert_eq!(normalized.stage, Stage::Salvaged);
        assert_eq!(normalized.record.education.match_level, 6);
        assert_eq!(normalized.record.skills.reasoning, PARSE_FAILURE_REASONING);
        assert_eq!(normalized.record.final_match.match_level, 1);
    }

    #[test]
    fn test_truncated_tail_is_trimmed_then_repaired() {
        let raw = r#"{"education": {"match_level": 6, "match_score": "80%", "reasoning": "MS"}, "skills": {"match_level": 4 "#;
        let normalized = normalize_with_report(raw);
        assert_eq!(normalized.stage, Stage::Repaired);
        assert_eq!(normalized.record.education.match_level, 6);
        assert_eq!(normalized.record.skills.reasoning, record::MISSING_REASONING);
    }

    #[test]
    fn test_inner_object_without_section_keys_falls_through_to_salvage() {
        let raw = r#"{"education": {"match_level": 6, "match_score": "80%", "reasoning": "MS"}, "skills": {"match_level": 4 "match_score": ??? }"#;
        // The only parseable span is the education body, which carries no section key.
        let normalized = normalize_with_report(raw);
        assert_eq!(normalized.stage, Stage::Salvaged);
        assert!(!normalized.stage.is_recovered());
        assert_eq!(normalized.record.education.match_level, 6);
        assert_eq!(normalized.record.education.reasoning, "MS");
        assert_eq!(normalized.record.skills.reasoning, PARSE_FAILURE_REASONING);
    }

    #[test]
    fn test_keyless_extraction_without_education_falls_back() {
        let normalized = normalize_with_report(r#"{"score": 5} and {"other": ??? }"#);
        assert_eq!(normalized.stage, Stage::Fallback);
        assert_eq!(normalized.record, MatchRecord::fallback(PARSE_FAILURE_REASONING));
    }

    #[test]
    fn test_empty_input_is_unrecovered() {
        for raw in ["", "   \n\t"] {
            let normalized = normalize_with_report(raw);
            assert_eq!(normalized.stage, Stage::Fallback);
            assert!(!normalized.stage.is_recovered());
            assert_eq!(normalized.record.education.reasoning, PARSE_FAILURE_REASONING);
            assert_eq!(normalized.record.final_match.match_level, 1);
        }
    }
}
