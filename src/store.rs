//! Durable sink for check results.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::models::CheckResult;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only store of uptime checks. Each call is its own unit of work.
#[async_trait]
pub trait UptimeStore: Send + Sync {
    async fn record(&self, result: &CheckResult) -> Result<(), StoreError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and verify the database answers before any request is served.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("PostgreSQL connection verified");
        Ok(Self { pool })
    }
}

#[async_trait]
impl UptimeStore for PgStore {
    async fn record(&self, result: &CheckResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO uptime_checks (website_id, status, response_time, status_code)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(result.website_id)
        .bind(result.status.as_str())
        .bind(i64::try_from(result.response_time_ms).unwrap_or(i64::MAX))
        .bind(i32::from(result.status_code))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
