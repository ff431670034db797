//! MatchRecord: the five-section evaluation schema returned by every normalization path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const EDUCATION: &str = "education";
pub const WORK_AND_PROJECT_EXPERIENCE: &str = "work_and_project_experience";
pub const SKILLS: &str = "skills";
pub const EXPERIENCE_YEAR: &str = "experience_year";
pub const FINAL_MATCH: &str = "Final_match";

/// All required section keys, in output order.
pub const SECTION_KEYS: [&str; 5] = [
    EDUCATION,
    WORK_AND_PROJECT_EXPERIENCE,
    SKILLS,
    EXPERIENCE_YEAR,
    FINAL_MATCH,
];

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 7;

/// Reasoning attached to a section the model never produced.
pub const MISSING_REASONING: &str = "Missing data";
/// Reasoning attached to a section the model produced in an unreadable shape.
pub const MALFORMED_REASONING: &str = "Malformed data";
/// Reasoning used by the terminal fallback record.
pub const PARSE_FAILURE_REASONING: &str = "Failed to parse";

const ZERO_SCORE: &str = "0%";

/// Score for one of the four category sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub match_level: u8,
    pub match_score: String,
    pub reasoning: String,
}

/// Score for the overall `Final_match` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub match_level: u8,
    #[serde(rename = "Final_match_score")]
    pub final_match_score: String,
    pub reasoning: String,
}

/// The full evaluation. All five sections are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub education: CategoryScore,
    pub work_and_project_experience: CategoryScore,
    pub skills: CategoryScore,
    pub experience_year: CategoryScore,
    #[serde(rename = "Final_match")]
    pub final_match: FinalScore,
}

impl CategoryScore {
    pub fn synthesized(reasoning: impl Into<String>) -> Self {
        Self {
            match_level: MIN_LEVEL,
            match_score: ZERO_SCORE.to_string(),
            reasoning: reasoning.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let section = value.as_object()?;
        Some(Self {
            match_level: read_level(section.get("match_level")?)?,
            match_score: read_score(section.get("match_score")?)?,
            reasoning: read_reasoning(section.get("reasoning")),
        })
    }
}

impl FinalScore {
    pub fn synthesized(reasoning: impl Into<String>) -> Self {
        Self {
            match_level: MIN_LEVEL,
            final_match_score: ZERO_SCORE.to_string(),
            reasoning: reasoning.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let section = value.as_object()?;
        let score = section
            .get("Final_match_score")
            .or_else(|| section.get("final_match_score"))?;
        Some(Self {
            match_level: read_level(section.get("match_level")?)?,
            final_match_score: read_score(score)?,
            reasoning: read_reasoning(section.get("reasoning")),
        })
    }
}

impl MatchRecord {
    /// A record where every section carries level 1, "0%" and the same reasoning.
    pub fn fallback(reasoning: &str) -> Self {
        Self::fallback_with(reasoning, reasoning)
    }

    /// Like [`MatchRecord::fallback`], but `education` carries its own reasoning.
    /// Used when the failure detail belongs in a single visible place.
    pub fn fallback_with(education_reasoning: &str, other_reasoning: &str) -> Self {
        Self {
            education: CategoryScore::synthesized(education_reasoning),
            work_and_project_experience: CategoryScore::synthesized(other_reasoning),
            skills: CategoryScore::synthesized(other_reasoning),
            experience_year: CategoryScore::synthesized(other_reasoning),
            final_match: FinalScore::synthesized(other_reasoning),
        }
    }

    /// Builds a record from a parsed JSON object, synthesizing any section that is
    /// missing or unreadable. Unknown top-level keys are dropped.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            education: category(map, EDUCATION),
            work_and_project_experience: category(map, WORK_AND_PROJECT_EXPERIENCE),
            skills: category(map, SKILLS),
            experience_year: category(map, EXPERIENCE_YEAR),
            final_match: match map.get(FINAL_MATCH) {
                None => {
                    warn_missing(FINAL_MATCH);
                    FinalScore::synthesized(MISSING_REASONING)
                }
                Some(value) => FinalScore::from_value(value).unwrap_or_else(|| {
                    warn_malformed(FINAL_MATCH);
                    FinalScore::synthesized(MALFORMED_REASONING)
                }),
            },
        }
    }
}

fn category(map: &Map<String, Value>, key: &str) -> CategoryScore {
    match map.get(key) {
        None => {
            warn_missing(key);
            CategoryScore::synthesized(MISSING_REASONING)
        }
        Some(value) => CategoryScore::from_value(value).unwrap_or_else(|| {
            warn_malformed(key);
            CategoryScore::synthesized(MALFORMED_REASONING)
        }),
    }
}

fn warn_missing(key: &str) {
    warn!("Missing expected key '{key}' in match result. Adding default value.");
}

fn warn_malformed(key: &str) {
    warn!("Key '{key}' in match result has an unreadable shape. Adding default value.");
}

/// Accepts `5`, `5.0` or `"5"`; clamps into 1..=7.
fn read_level(value: &Value) -> Option<u8> {
    let level = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !level.is_finite() {
        return None;
    }
    let clamped = level.round().clamp(MIN_LEVEL as f64, MAX_LEVEL as f64);
    if clamped != level {
        warn!("match_level {level} outside 1..=7, using {clamped}");
    }
    Some(clamped as u8)
}

/// Accepts `"85%"`, `"85"` or `85`, always rendering a percent sign.
/// Non-numeric strings are kept verbatim.
fn read_score(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.ends_with('%') && trimmed.parse::<f64>().is_ok() {
                Some(format!("{trimmed}%"))
            } else {
                Some(s.clone())
            }
        }
        Value::Number(n) => Some(format!("{n}%")),
        _ => None,
    }
}

fn read_reasoning(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
