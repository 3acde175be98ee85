//! Axum route handlers for saved portfolios.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::portfolio::GeneratedPortfolio;
use crate::state::AppState;
use crate::storage::{NewPortfolio, SavedPortfolio};

fn ensure_html(portfolio: &GeneratedPortfolio) -> Result<(), AppError> {
    if portfolio.html.trim().is_empty() {
        return Err(AppError::Validation("html cannot be empty".to_string()));
    }
    Ok(())
}

/// POST /api/v1/portfolios
pub async fn handle_save_portfolio(
    State(state): State<AppState>,
    Json(request): Json<NewPortfolio>,
) -> Result<(StatusCode, Json<SavedPortfolio>), AppError> {
    ensure_html(&request.portfolio)?;
    let saved = state.store.save(request).await?;
    tracing::info!("Saved portfolio {} ({})", saved.id, saved.template_id);
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/portfolios/:id
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedPortfolio>, AppError> {
    state
        .store
        .fetch(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))
}

/// PUT /api/v1/portfolios/:id
///
/// Replaces the stored code; the resume and template stay as saved.
pub async fn handle_update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(portfolio): Json<GeneratedPortfolio>,
) -> Result<Json<SavedPortfolio>, AppError> {
    ensure_html(&portfolio)?;
    state
        .store
        .update_code(id, portfolio)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))
}
