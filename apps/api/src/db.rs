use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::storage::{MemoryPortfolioStore, PgPortfolioStore, PortfolioStore};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .context("Failed to connect to DATABASE_URL")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// PostgreSQL-backed store when DATABASE_URL is set, in-memory otherwise.
pub async fn create_store(config: &Config) -> Result<Arc<dyn PortfolioStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            let store = PgPortfolioStore::connect(pool)
                .await
                .context("Failed to prepare the portfolios table")?;
            Ok(Arc::new(store))
        }
        None => {
            info!("DATABASE_URL not set; saved portfolios are kept in memory");
            Ok(Arc::new(MemoryPortfolioStore::new()))
        }
    }
}
