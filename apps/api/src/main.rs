mod config;
mod db;
mod editor;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;
mod storage;
mod structuring;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_store;
use crate::extraction::TextExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.google_api_key.clone(), config.stage_timeout)?;
    if llm.has_api_key() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("GOOGLE_GENERATIVE_AI_API_KEY not set; AI stages will use their fallbacks");
    }

    // Initialize portfolio store (PostgreSQL or in-memory)
    let store = create_store(&config).await?;

    // PDF extraction: pdf-extract first, printable byte scan second
    let extractor = TextExtractor::standard(config.stage_timeout);
    info!(
        "Stage timeout {:?}, upload limit {} bytes",
        config.stage_timeout, config.max_upload_bytes
    );

    // Build app state
    let state = AppState::new(config.clone(), Arc::new(llm), extractor, store);
    state.orchestrator.spawn_session_sweeper(config.session_ttl);
    info!("Idle sessions expire after {:?}", config.session_ttl);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
