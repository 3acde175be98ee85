//! Axum route handlers for portfolio generation and the template catalog.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FailureReport};
use crate::generation::templates::{
    all_templates, template_by_id, templates_by_category, PortfolioTemplate, CATEGORIES,
};
use crate::models::portfolio::GeneratedPortfolio;
use crate::models::resume::StructuredResume;
use crate::state::AppState;

const DEFAULT_TEMPLATE_ID: &str = "modern-developer";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePortfolioRequest {
    pub structured_data: Option<StructuredResume>,
    pub template_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePortfolioResponse {
    pub success: bool,
    pub portfolio: GeneratedPortfolio,
    pub template_id: String,
    pub used_fallback: bool,
    pub fallback_reason: Option<FailureReport>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<&'static PortfolioTemplate>,
    pub categories: &'static [&'static str],
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate-portfolio-code
///
/// Structured resume + optional template id → html/css/js.
/// Generation failures still answer 200 with the fallback document.
pub async fn handle_generate_portfolio(
    State(state): State<AppState>,
    Json(request): Json<GeneratePortfolioRequest>,
) -> Result<Json<GeneratePortfolioResponse>, AppError> {
    let resume = request
        .structured_data
        .ok_or_else(|| AppError::Validation("No structured data provided".to_string()))?;
    let template_id = request
        .template_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPLATE_ID.to_string());

    let outcome = state.generator.generate(&resume, &template_id).await;

    Ok(Json(GeneratePortfolioResponse {
        success: true,
        portfolio: outcome.portfolio,
        template_id,
        used_fallback: outcome.used_fallback,
        fallback_reason: outcome.fallback_reason,
    }))
}

/// GET /api/v1/templates[?category=Creative]
pub async fn handle_list_templates(
    Query(query): Query<TemplateQuery>,
) -> Json<TemplateListResponse> {
    let templates = match query.category.as_deref() {
        Some(category) if !category.eq_ignore_ascii_case("all") => {
            templates_by_category(category)
        }
        _ => all_templates().iter().collect(),
    };

    Json(TemplateListResponse {
        templates,
        categories: CATEGORIES,
    })
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    Path(template_id): Path<String>,
) -> Result<Json<&'static PortfolioTemplate>, AppError> {
    template_by_id(&template_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id} not found")))
}
