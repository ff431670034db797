//! Axum route handlers for the matching API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::matching::matcher::{
    parse_job_description, parse_resume, process_resume_and_jd, ProcessResult,
};
use crate::normalizer::validate_json_output;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ParseResumeRequest {
    pub resume: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseJdRequest {
    pub jd: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume: String,
    pub jd: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub text: String,
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/parse-resume
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Json(request): Json<ParseResumeRequest>,
) -> Result<Json<Value>, AppError> {
    require_text(&request.resume, "resume")?;
    Ok(Json(parse_resume(&request.resume, state.llm.as_ref()).await))
}

/// POST /api/v1/parse-jd
pub async fn handle_parse_jd(
    State(state): State<AppState>,
    Json(request): Json<ParseJdRequest>,
) -> Result<Json<Value>, AppError> {
    require_text(&request.jd, "jd")?;
    Ok(Json(parse_job_description(&request.jd, state.llm.as_ref()).await))
}

/// POST /api/v1/match
///
/// Parses both documents and scores them. Always returns all five sections.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<ProcessResult>, AppError> {
    require_text(&request.resume, "resume")?;
    require_text(&request.jd, "jd")?;

    let result = process_resume_and_jd(
        &request.resume,
        &request.jd,
        state.llm.as_ref(),
        state.config.repair_retry,
    )
    .await;

    Ok(Json(result))
}

/// POST /api/v1/validate
///
/// Runs the JSON recovery pipeline on arbitrary text. 200 with the recovered
/// object, or 422 with the diagnostic.
pub async fn handle_validate(Json(request): Json<ValidateRequest>) -> Response {
    match validate_json_output(&request.text) {
        Ok(value) => Json(value).into_response(),
        Err(diagnostic) => (StatusCode::UNPROCESSABLE_ENTITY, Json(diagnostic)).into_response(),
    }
}
