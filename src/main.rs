use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod api;
mod config;
mod engine;
mod error;
mod models;
mod store;
#[cfg(test)]
mod testing;

use crate::api::AppState;
use crate::config::{CheckerConfig, Secrets, DEFAULT_CONFIG_PATH, DEFAULT_ENV_PATH};
use crate::engine::Checker;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .init();

    let config_path = std::env::var("UPTIME_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = CheckerConfig::load(&config_path)?;
    Secrets::load_dotenv(Path::new(DEFAULT_ENV_PATH));
    let secrets = Secrets::from_env()?;

    let store = PgStore::connect(&secrets.database_url, config.db_max_connections)
        .await
        .context("Unable to connect to database")?;

    let checker = Checker::new(&config, Arc::new(store))?;
    tracing::info!(
        "--- Max batch: {} URLs, degraded above {}ms ---",
        checker.max_batch_size(),
        config.degraded_threshold_ms
    );

    let state = AppState {
        checker: Arc::new(checker),
        api_key: Arc::from(secrets.api_key),
    };
    api::start_server(config.api_port, state).await
}
