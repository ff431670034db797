//! Candidate extraction and partial salvage for text that failed whole-body parsing.

use serde_json::{Map, Value};
use tracing::debug;

use super::clean::clean_json_string;
use super::parse_object;
use super::record::{EDUCATION, EXPERIENCE_YEAR, FINAL_MATCH, SKILLS, WORK_AND_PROJECT_EXPERIENCE};
use super::repair::attempt_repair;

/// Every balanced `{...}` span in `text`, leftmost first and non-overlapping.
///
/// A `{` without a matching `}` is skipped, so complete objects nested inside a
/// truncated one are still found. Braces inside string values are counted like
/// any other. Single pass over the bytes plus a sort of the matched pairs.
pub fn balanced_spans(text: &str) -> Vec<&str> {
    let mut open = Vec::new();
    let mut pairs = Vec::new();

    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, i));
                }
            }
            _ => {}
        }
    }

    pairs.sort_unstable();

    let mut spans = Vec::new();
    let mut next_free = 0;
    for (start, end) in pairs {
        if start >= next_free {
            spans.push(&text[start..=end]);
            next_free = end + 1;
        }
    }
    spans
}

/// Cleans and parses each balanced span independently, returning the first object
/// that parses either directly or after one repair pass.
pub fn extract_from_spans(text: &str) -> Option<Map<String, Value>> {
    let spans = balanced_spans(text);
    debug!(candidates = spans.len(), "scanning balanced spans");

    spans.into_iter().find_map(|span| {
        let cleaned = clean_json_string(span);
        parse_object(&cleaned)
            .or_else(|_| parse_object(&attempt_repair(&cleaned)))
            .ok()
    })
}

const EDUCATION_MARKER: &str = "\"education\"";

/// Slices the `education` section out of otherwise unparseable text.
///
/// The fragment runs from the `"education"` marker to the next known section
/// marker. Returns the section value, not the wrapping object.
pub fn salvage_education(text: &str) -> Option<Value> {
    let start = text.find(EDUCATION_MARKER)?;
    let after_marker = start + EDUCATION_MARKER.len();

    let next_section = [WORK_AND_PROJECT_EXPERIENCE, SKILLS, EXPERIENCE_YEAR, FINAL_MATCH]
        .iter()
        .filter_map(|key| text[after_marker..].find(&format!("\"{key}\"")))
        .min()
        .map(|offset| after_marker + offset)?;

    let fragment = text[start..next_section].trim_end().trim_end_matches(',');
    let wrapped = format!("{{{fragment}}}");

    let mut section = parse_object(&wrapped)
        .or_else(|_| parse_object(&attempt_repair(&wrapped)))
        .ok()?;
    debug!("salvaged education section from unparseable response");
    section.remove(EDUCATION)
}
