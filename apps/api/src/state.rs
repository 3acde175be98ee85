use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::generation::PortfolioGenerator;
use crate::llm_client::TextGenerator;
use crate::pipeline::Orchestrator;
use crate::storage::PortfolioStore;
use crate::structuring::ResumeStructurer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: TextExtractor,
    pub structurer: ResumeStructurer,
    pub generator: PortfolioGenerator,
    /// Session pipelines. Stage services are shared with the stateless endpoints.
    pub orchestrator: Arc<Orchestrator>,
    /// PostgreSQL when DATABASE_URL is set, in-memory otherwise.
    pub store: Arc<dyn PortfolioStore>,
}

impl AppState {
    /// Wires the stage services around one model client.
    pub fn new(
        config: Config,
        llm: Arc<dyn TextGenerator>,
        extractor: TextExtractor,
        store: Arc<dyn PortfolioStore>,
    ) -> Self {
        let structurer = ResumeStructurer::new(llm.clone(), config.stage_timeout);
        let generator = PortfolioGenerator::new(llm, config.stage_timeout);
        let orchestrator = Arc::new(Orchestrator::new(
            extractor.clone(),
            structurer.clone(),
            generator.clone(),
        ));

        Self {
            config,
            extractor,
            structurer,
            generator,
            orchestrator,
            store,
        }
    }
}
