// Shared prompt fragments and prompt-building utilities.
// Feature prompts live in a prompts.rs next to the module that sends them.

use crate::normalizer::DefectFlags;

/// Appended to every prompt that expects a JSON object back.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    CRITICAL: Your output MUST be ONLY a valid JSON object with no additional text, \
    comments, or explanations before or after the JSON. \
    Do not wrap the JSON in markdown code blocks or any other formatting.";

/// Builds corrective formatting instructions for the defects seen in a previous reply.
/// Returns an empty string when no repairable defect was found.
pub fn format_hints(defects: &DefectFlags) -> String {
    let mut hints = Vec::new();

    if defects.missing_quotes {
        hints.push("Make sure ALL property names are surrounded by double quotes.");
    }
    if defects.trailing_comma {
        hints.push("Do NOT include trailing commas after the last item in arrays or objects.");
    }
    if defects.unbalanced_braces {
        hints.push("Ensure all opening braces '{' have matching closing braces '}'.");
    }
    if defects.invalid_value {
        hints.push(
            "Every property must have a valid value. Do not leave properties with empty values.",
        );
    }

    hints.join("\n")
}
