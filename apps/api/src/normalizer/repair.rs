//! Structural repair: classify syntactic defects, then apply the matching fixes.
//!
//! Each defect maps to one independent fix in [`REPAIR_RULES`]. The table is walked
//! in order and every rule whose predicate holds is applied once. Predicates are
//! evaluated against the classification of the input, not the partially repaired text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

lazy_static! {
    static ref BARE_KEY: Regex = Regex::new(r"([{,])\s*([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap();
    static ref TRAILING_COMMA: Regex = Regex::new(r",(\s*[}\]])").unwrap();
    static ref EMPTY_BEFORE_COMMA: Regex = Regex::new(r":\s*,").unwrap();
    static ref EMPTY_AT_END: Regex = Regex::new(r":\s*$").unwrap();
    static ref EMPTY_BEFORE_BRACE: Regex = Regex::new(r":\s*\}").unwrap();
}

/// Independent syntactic defects detected in a candidate JSON string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectFlags {
    pub missing_quotes: bool,
    pub unbalanced_braces: bool,
    pub trailing_comma: bool,
    /// Reported for diagnostics only; no rule repairs it.
    pub invalid_property_name: bool,
    pub invalid_value: bool,
}

impl DefectFlags {
    pub fn any(&self) -> bool {
        self.missing_quotes
            || self.unbalanced_braces
            || self.trailing_comma
            || self.invalid_property_name
            || self.invalid_value
    }
}

/// One row of the repair table.
pub struct RepairRule {
    pub name: &'static str,
    pub applies: fn(&DefectFlags) -> bool,
    pub fix: fn(&str) -> String,
}

pub const REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        name: "quote_bare_keys",
        applies: has_missing_quotes,
        fix: quote_bare_keys,
    },
    RepairRule {
        name: "strip_trailing_commas",
        applies: has_trailing_comma,
        fix: strip_trailing_commas,
    },
    RepairRule {
        name: "balance_braces",
        applies: has_unbalanced_braces,
        fix: balance_braces,
    },
    RepairRule {
        name: "null_empty_values",
        applies: has_invalid_value,
        fix: null_empty_values,
    },
];

pub fn classify_defects(text: &str) -> DefectFlags {
    let (open, close) = brace_counts(text);
    let flags = DefectFlags {
        missing_quotes: BARE_KEY.is_match(text),
        unbalanced_braces: open != close,
        trailing_comma: TRAILING_COMMA.is_match(text),
        invalid_property_name: false,
        invalid_value: EMPTY_AT_END.is_match(text) || EMPTY_BEFORE_COMMA.is_match(text),
    };
    debug!(?flags, "JSON defect classification");
    flags
}

/// Classifies `text` and applies every matching rule. Well-formed JSON with no
/// detected defects comes back unchanged.
pub fn attempt_repair(text: &str) -> String {
    let flags = classify_defects(text);
    apply_rules(text, &flags)
}

pub fn apply_rules(text: &str, flags: &DefectFlags) -> String {
    REPAIR_RULES
        .iter()
        .filter(|rule| (rule.applies)(flags))
        .fold(text.to_string(), |acc, rule| {
            debug!(rule = rule.name, "applying JSON repair");
            (rule.fix)(&acc)
        })
}

fn has_missing_quotes(flags: &DefectFlags) -> bool {
    flags.missing_quotes
}

fn has_trailing_comma(flags: &DefectFlags) -> bool {
    flags.trailing_comma
}

fn has_unbalanced_braces(flags: &DefectFlags) -> bool {
    flags.unbalanced_braces
}

fn has_invalid_value(flags: &DefectFlags) -> bool {
    flags.invalid_value
}

pub fn quote_bare_keys(text: &str) -> String {
    BARE_KEY.replace_all(text, r#"${1}"${2}":"#).into_owned()
}

pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "${1}").into_owned()
}

/// Appends missing `}` at the end or prepends missing `{` at the start.
/// Counts every brace, including ones inside string values.
pub fn balance_braces(text: &str) -> String {
    let (open, close) = brace_counts(text);
    if open > close {
        format!("{text}{}", "}".repeat(open - close))
    } else if close > open {
        format!("{}{text}", "{".repeat(close - open))
    } else {
        text.to_string()
    }
}

pub fn null_empty_values(text: &str) -> String {
    let text = EMPTY_BEFORE_COMMA.replace_all(text, ": null,");
    let text = EMPTY_AT_END.replace_all(&text, ": null");
    EMPTY_BEFORE_BRACE.replace_all(&text, ": null}").into_owned()
}

fn brace_counts(text: &str) -> (usize, usize) {
    text.chars().fold((0, 0), |(open, close), c| match c {
        '{' => (open + 1, close),
        '}' => (open, close + 1),
        _ => (open, close),
    })
}
