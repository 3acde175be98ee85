pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers as generation;
use crate::pipeline::handlers as pipeline;
use crate::state::AppState;
use crate::storage::handlers as storage;
use crate::structuring::handlers as structuring;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless stage API
        .route(
            "/api/v1/parse-resume",
            post(structuring::handle_parse_resume),
        )
        .route(
            "/api/v1/process-resume-text",
            post(structuring::handle_process_text),
        )
        .route(
            "/api/v1/generate-portfolio-code",
            post(generation::handle_generate_portfolio),
        )
        // Template catalog
        .route("/api/v1/templates", get(generation::handle_list_templates))
        .route(
            "/api/v1/templates/:id",
            get(generation::handle_get_template),
        )
        // Session pipeline
        .route("/api/v1/sessions", post(pipeline::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(pipeline::handle_get_session).delete(pipeline::handle_discard_session),
        )
        .route("/api/v1/sessions/:id/upload", post(pipeline::handle_upload))
        .route(
            "/api/v1/sessions/:id/template",
            put(pipeline::handle_select_template),
        )
        .route(
            "/api/v1/sessions/:id/portfolio",
            put(pipeline::handle_edit_portfolio),
        )
        .route("/api/v1/sessions/:id/preview", get(pipeline::handle_preview))
        .route(
            "/api/v1/sessions/:id/download",
            get(pipeline::handle_download),
        )
        .route("/api/v1/sessions/:id/reset", post(pipeline::handle_reset))
        // Saved portfolios
        .route("/api/v1/portfolios", post(storage::handle_save_portfolio))
        .route(
            "/api/v1/portfolios/:id",
            get(storage::handle_get_portfolio).put(storage::handle_update_portfolio),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
