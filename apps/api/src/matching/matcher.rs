//! Matcher: document extraction and resume ↔ JD evaluation.
//!
//! Flow: parse_resume + parse_job_description (concurrently) → match_resume_to_jd
//!       → normalizer → MatchRecord.
//!
//! Nothing here returns an error: API and parse failures are folded into
//! placeholder documents or fallback records so callers always get a result.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::llm_client::prompts::{format_hints, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{ChatBackend, ChatRequest};
use crate::matching::prompts::{
    JD_PARSE_SYSTEM, MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM_TEMPLATE, RESUME_PARSE_SYSTEM,
    RETRY_PREAMBLE,
};
use crate::normalizer::{clean_json_string, normalize_with_report, MatchRecord, Normalized};

/// Which document is being extracted. Decides the placeholder keys on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    JobDescription,
}

impl DocumentKind {
    fn system_prompt(self) -> &'static str {
        match self {
            DocumentKind::Resume => RESUME_PARSE_SYSTEM,
            DocumentKind::JobDescription => JD_PARSE_SYSTEM,
        }
    }

    fn parsed_text_key(self) -> &'static str {
        match self {
            DocumentKind::Resume => "parsed_resume_text",
            DocumentKind::JobDescription => "parsed_jd_text",
        }
    }

    fn raw_key(self) -> &'static str {
        match self {
            DocumentKind::Resume => "raw_resume",
            DocumentKind::JobDescription => "raw_jd",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DocumentKind::Resume => "Resume",
            DocumentKind::JobDescription => "Job description",
        }
    }
}

/// Full output of [`process_resume_and_jd`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub parsed_resume: Value,
    pub parsed_job_description: Value,
    pub matching_result: MatchRecord,
}

pub async fn parse_resume(resume_text: &str, llm: &dyn ChatBackend) -> Value {
    parse_document(DocumentKind::Resume, resume_text, llm).await
}

pub async fn parse_job_description(jd_text: &str, llm: &dyn ChatBackend) -> Value {
    parse_document(DocumentKind::JobDescription, jd_text, llm).await
}

/// Extracts structured fields from one document.
///
/// A non-JSON reply is kept as text next to the input; an API failure is reported
/// under `error`.
pub async fn parse_document(kind: DocumentKind, text: &str, llm: &dyn ChatBackend) -> Value {
    let request = ChatRequest::new(kind.system_prompt(), text);

    let reply = match llm.complete(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Error parsing {}: {e}", kind.label().to_lowercase());
            return json!({ "error": e.to_string(), kind.raw_key(): text });
        }
    };
    info!("{} parsed successfully", kind.label());

    match serde_json::from_str::<Value>(&clean_json_string(&reply)) {
        Ok(structured) => structured,
        Err(_) => {
            warn!(
                "{} parsing response was not valid JSON, keeping it as text",
                kind.label()
            );
            json!({ kind.parsed_text_key(): reply, kind.raw_key(): text })
        }
    }
}

/// Scores a parsed resume against a parsed job description.
///
/// When `repair_retry` is set and the first reply cannot be recovered as a whole
/// JSON object, the model is asked exactly once more with formatting hints.
pub async fn match_resume_to_jd(
    resume: &Value,
    jd: &Value,
    llm: &dyn ChatBackend,
    repair_retry: bool,
) -> MatchRecord {
    let system = MATCH_SYSTEM_TEMPLATE.replace("{json_only}", JSON_ONLY_INSTRUCTION);
    let prompt = MATCH_PROMPT_TEMPLATE
        .replace("{resume_json}", &pretty(resume))
        .replace("{jd_json}", &pretty(jd));

    let first = match request_match(&system, &prompt, llm).await {
        Ok(normalized) => normalized,
        Err(record) => return record,
    };

    if first.stage.is_recovered() || !repair_retry {
        return first.record;
    }

    warn!(stage = ?first.stage, "match reply unrecoverable, retrying once with format hints");
    let hints = format_hints(&first.defects);
    let retry_prompt = if hints.is_empty() {
        format!("{prompt}\n\n{RETRY_PREAMBLE}\n{JSON_ONLY_INSTRUCTION}")
    } else {
        format!("{prompt}\n\n{RETRY_PREAMBLE}\n{hints}")
    };

    match request_match(&system, &retry_prompt, llm).await {
        Ok(second) if second.stage.is_recovered() => second.record,
        _ => first.record,
    }
}

/// One match call. `Err` carries the API-failure fallback record.
async fn request_match(
    system: &str,
    prompt: &str,
    llm: &dyn ChatBackend,
) -> Result<Normalized, MatchRecord> {
    let request = ChatRequest::new(system, prompt).json();
    match llm.complete(&request).await {
        Ok(reply) => {
            info!("Resume-JD matching completed");
            Ok(normalize_with_report(&reply))
        }
        Err(e) => {
            error!("Error matching resume to job description: {e}");
            Err(MatchRecord::fallback_with(
                &format!("API Error: {e}"),
                "Processing error",
            ))
        }
    }
}

/// Parses both documents, then matches them.
pub async fn process_resume_and_jd(
    resume_text: &str,
    jd_text: &str,
    llm: &dyn ChatBackend,
    repair_retry: bool,
) -> ProcessResult {
    let (parsed_resume, parsed_job_description) = tokio::join!(
        parse_resume(resume_text, llm),
        parse_job_description(jd_text, llm)
    );

    let matching_result =
        match_resume_to_jd(&parsed_resume, &parsed_job_description, llm, repair_retry).await;

    ProcessResult {
        parsed_resume,
        parsed_job_description,
        matching_result,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
