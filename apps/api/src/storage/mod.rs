//! Portfolio Store: saved portfolios that outlive a session.
//!
//! `PgPortfolioStore` backs it with the `portfolios` table when DATABASE_URL
//! is set; otherwise `MemoryPortfolioStore` keeps them for the process lifetime.

pub mod handlers;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::portfolio::GeneratedPortfolio;
use crate::models::resume::StructuredResume;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPortfolio {
    pub id: Uuid,
    pub template_id: String,
    pub resume: StructuredResume,
    pub portfolio: GeneratedPortfolio,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolio {
    pub template_id: String,
    pub resume: StructuredResume,
    pub portfolio: GeneratedPortfolio,
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn save(&self, new: NewPortfolio) -> Result<SavedPortfolio, StoreError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<SavedPortfolio>, StoreError>;

    /// Replaces the code of an existing portfolio. `None` when `id` is unknown.
    async fn update_code(
        &self,
        id: Uuid,
        portfolio: GeneratedPortfolio,
    ) -> Result<Option<SavedPortfolio>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS portfolios (
    id          UUID PRIMARY KEY,
    template_id TEXT NOT NULL,
    resume      JSONB NOT NULL,
    html        TEXT NOT NULL,
    css         TEXT NOT NULL DEFAULT '',
    js          TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

#[derive(Debug, FromRow)]
struct PortfolioRow {
    id: Uuid,
    template_id: String,
    resume: Json<StructuredResume>,
    html: String,
    css: String,
    js: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PortfolioRow> for SavedPortfolio {
    fn from(row: PortfolioRow) -> Self {
        SavedPortfolio {
            id: row.id,
            template_id: row.template_id,
            resume: row.resume.0,
            portfolio: GeneratedPortfolio {
                html: row.html,
                css: row.css,
                js: row.js,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgPortfolioStore {
    pool: PgPool,
}

impl PgPortfolioStore {
    /// Wraps the pool and creates the `portfolios` table if it is missing.
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        info!("Portfolio store ready (PostgreSQL)");
        Ok(Self { pool })
    }
}

#[async_trait]
impl PortfolioStore for PgPortfolioStore {
    async fn save(&self, new: NewPortfolio) -> Result<SavedPortfolio, StoreError> {
        let row = sqlx::query_as::<_, PortfolioRow>(
            "INSERT INTO portfolios (id, template_id, resume, html, css, js)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.template_id)
        .bind(Json(&new.resume))
        .bind(&new.portfolio.html)
        .bind(&new.portfolio.css)
        .bind(&new.portfolio.js)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<SavedPortfolio>, StoreError> {
        let row = sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SavedPortfolio::from))
    }

    async fn update_code(
        &self,
        id: Uuid,
        portfolio: GeneratedPortfolio,
    ) -> Result<Option<SavedPortfolio>, StoreError> {
        let row = sqlx::query_as::<_, PortfolioRow>(
            "UPDATE portfolios SET html = $2, css = $3, js = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&portfolio.html)
        .bind(&portfolio.css)
        .bind(&portfolio.js)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SavedPortfolio::from))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryPortfolioStore {
    portfolios: RwLock<HashMap<Uuid, SavedPortfolio>>,
}

impl MemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for MemoryPortfolioStore {
    async fn save(&self, new: NewPortfolio) -> Result<SavedPortfolio, StoreError> {
        let now = Utc::now();
        let saved = SavedPortfolio {
            id: Uuid::new_v4(),
            template_id: new.template_id,
            resume: new.resume,
            portfolio: new.portfolio,
            created_at: now,
            updated_at: now,
        };
        self.portfolios
            .write()
            .await
            .insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<SavedPortfolio>, StoreError> {
        Ok(self.portfolios.read().await.get(&id).cloned())
    }

    async fn update_code(
        &self,
        id: Uuid,
        portfolio: GeneratedPortfolio,
    ) -> Result<Option<SavedPortfolio>, StoreError> {
        let mut portfolios = self.portfolios.write().await;
        Ok(portfolios.get_mut(&id).map(|saved| {
            saved.portfolio = portfolio;
            saved.updated_at = Utc::now();
            saved.clone()
        }))
    }
}
