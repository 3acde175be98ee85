//! Axum route handlers for the session pipeline API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::editor::PREVIEW_CSP;
use crate::errors::AppError;
use crate::models::portfolio::PortfolioEdit;
use crate::pipeline::SessionSnapshot;
use crate::routes::upload::read_pdf_upload;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTemplateRequest {
    pub template_id: String,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.orchestrator.create_session().await;
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
///
/// Polled by the client to follow stage and progress.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.orchestrator.snapshot(session_id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.orchestrator.discard(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/upload
///
/// Starts the pipeline and returns immediately with the `parsing` snapshot.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let document = read_pdf_upload(multipart).await?;
    let snapshot = state
        .orchestrator
        .start_upload(session_id, document)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// PUT /api/v1/sessions/:id/template
pub async fn handle_select_template(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectTemplateRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .orchestrator
        .select_template(session_id, request.template_id.trim())
        .await?;
    Ok(Json(snapshot))
}

/// PUT /api/v1/sessions/:id/portfolio
///
/// Partial update of html/css/js. Only allowed once the run is complete.
pub async fn handle_edit_portfolio(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(edit): Json<PortfolioEdit>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        state.orchestrator.edit_portfolio(session_id, edit).await?,
    ))
}

/// GET /api/v1/sessions/:id/preview
///
/// The standalone document, sandboxed so its scripts run without the app's origin.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.orchestrator.preview(session_id).await?;
    Ok(([(header::CONTENT_SECURITY_POLICY, PREVIEW_CSP)], Html(document)))
}

/// GET /api/v1/sessions/:id/download
pub async fn handle_download(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rendered = state.orchestrator.download(session_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", rendered.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.html,
    ))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.orchestrator.reset(session_id).await?))
}
