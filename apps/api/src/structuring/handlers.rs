//! Axum route handlers for the stateless extraction + structuring endpoints.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, FailureReport};
use crate::extraction::ensure_structurable;
use crate::models::document::{ExtractedText, TextSource};
use crate::models::resume::StructuredResume;
use crate::routes::upload::read_pdf_upload;
use crate::state::AppState;

/// How much of the extracted text is echoed back for debugging.
const RAW_TEXT_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResumeResponse {
    pub success: bool,
    pub data: StructuredResume,
    pub raw_text: String,
    pub text_source: TextSource,
    pub used_fallback: bool,
    pub fallback_reason: Option<FailureReport>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextResponse {
    pub success: bool,
    pub data: StructuredResume,
    pub used_fallback: bool,
    pub fallback_reason: Option<FailureReport>,
}

/// POST /api/v1/parse-resume
///
/// Multipart `file` → extracted text → structured resume. Only extraction
/// failures are returned as errors; structuring always yields a resume.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let document = read_pdf_upload(multipart).await?;
    info!(
        "Parsing uploaded resume {:?} ({} bytes)",
        document.file_name,
        document.byte_size()
    );

    let extracted = state.extractor.extract_for_structuring(&document).await?;
    drop(document);

    let outcome = state.structurer.structure(&extracted).await;

    Ok(Json(ParseResumeResponse {
        success: true,
        data: outcome.resume,
        raw_text: extracted.preview(RAW_TEXT_PREVIEW_CHARS),
        text_source: extracted.source,
        used_fallback: outcome.used_fallback,
        fallback_reason: outcome.fallback_reason,
    }))
}

/// POST /api/v1/process-resume-text
///
/// Structures text that was extracted elsewhere.
pub async fn handle_process_text(
    State(state): State<AppState>,
    Json(request): Json<ProcessTextRequest>,
) -> Result<Json<ProcessTextResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("No text provided".to_string()));
    }

    let extracted = ExtractedText::new(request.text, TextSource::Primary);
    ensure_structurable(&extracted)?;

    let outcome = state.structurer.structure(&extracted).await;

    Ok(Json(ProcessTextResponse {
        success: true,
        data: outcome.resume,
        used_fallback: outcome.used_fallback,
        fallback_reason: outcome.fallback_reason,
    }))
}
