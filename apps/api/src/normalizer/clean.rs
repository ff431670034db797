//! Cleanup stages: fence stripping, boundary trimming, literal normalization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRUE_LITERAL: Regex = Regex::new(r"\bTrue\b").unwrap();
    static ref FALSE_LITERAL: Regex = Regex::new(r"\bFalse\b").unwrap();
    static ref NONE_LITERAL: Regex = Regex::new(r"\bNone\b").unwrap();
}

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Runs the three cleanup stages in order. Empty input becomes `{}`.
pub fn clean_json_string(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "{}".to_string();
    }

    let text = trim_to_braces(strip_fences(raw));
    let text = normalize_literals(text);
    fix_final_score_key(text)
}

/// Returns the content between the first fence pair, preferring a ```json fence.
/// An unterminated fence leaves the text untouched.
pub fn strip_fences(text: &str) -> &str {
    let opener = if text.contains(JSON_FENCE) {
        JSON_FENCE
    } else if text.contains(FENCE) {
        FENCE
    } else {
        return text;
    };

    let Some(start) = text.find(opener).map(|i| i + opener.len()) else {
        return text;
    };
    match text[start..].find(FENCE) {
        Some(len) => text[start..start + len].trim(),
        None => text,
    }
}

/// Keeps the span from the first `{` to the last `}`. Text without a usable span
/// is returned as-is and left for the parser to reject.
pub fn trim_to_braces(text: &str) -> &str {
    let Some(first) = text.find('{') else {
        return text;
    };
    match text.rfind('}') {
        Some(last) if last > first => &text[first..=last],
        _ => text,
    }
}

/// Swaps single quotes for double quotes and Python literals for JSON ones.
///
/// The quote swap is blind: an apostrophe inside a value becomes a stray `"`
/// and the text will no longer parse.
pub fn normalize_literals(text: &str) -> String {
    let text = text.replace('\'', "\"");
    let text = FALSE_LITERAL.replace_all(&text, "false");
    let text = TRUE_LITERAL.replace_all(&text, "true");
    NONE_LITERAL.replace_all(&text, "null").into_owned()
}

fn fix_final_score_key(text: String) -> String {
    if !text.contains("Final_match_score") && text.contains("final_match_score") {
        text.replace("final_match_score", "Final_match_score")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_prefers_json_fence() {
        let input = "Here:\n```\nnot this\n```\n```json\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_generic_fence() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_unterminated_is_noop() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_fences(input), input);
    }

    #[test]
    fn test_strip_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_fences(input), input);
    }

    #[test]
    fn test_trim_to_braces_drops_surrounding_prose() {
        let input = "Sure! Here is the result: {\"a\": {\"b\": 1}} Hope this helps.";
        assert_eq!(trim_to_braces(input), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_trim_to_braces_without_open_brace() {
        assert_eq!(trim_to_braces("hello world"), "hello world");
        assert_eq!(trim_to_braces("} backwards {"), "} backwards {");
    }

    #[test]
    fn test_normalize_literals() {
        let input = "{'a': True, 'b': False, 'c': None}";
        assert_eq!(
            normalize_literals(input),
            "{\"a\": true, \"b\": false, \"c\": null}"
        );
    }

    #[test]
    fn test_normalize_literals_leaves_words_containing_literals() {
        let input = "{\"reasoning\": \"Nonetheless Truely\"}";
        assert_eq!(normalize_literals(input), input);
    }

    #[test]
    fn test_clean_empty_input() {
        assert_eq!(clean_json_string(""), "{}");
        assert_eq!(clean_json_string("   \n"), "{}");
    }

    #[test]
    fn test_clean_fixes_lowercase_final_score_key() {
        let cleaned = clean_json_string("{\"Final_match\": {\"final_match_score\": \"70%\"}}");
        assert!(cleaned.contains("\"Final_match_score\""));
    }

    #[test]
    fn test_clean_full_chain() {
        let input = "Result below\n```json\n{'ok': True}\n```\nthanks";
        assert_eq!(clean_json_string(input), "{\"ok\": true}");
    }
}
