use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_ENV_PATH: &str = ".env";

/// Tunables read from `config.json`. Every field has a default so the file is optional.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold_ms: u64,
    /// Per-probe deadline. `0` disables it.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
}

fn default_api_port() -> u16 { 3000 }
fn default_max_batch_size() -> usize { 5 }
fn default_degraded_threshold() -> u64 { 1000 }
fn default_probe_timeout() -> u64 { 10_000 }
fn default_db_max_connections() -> u32 { 5 }

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            max_batch_size: default_max_batch_size(),
            degraded_threshold_ms: default_degraded_threshold(),
            probe_timeout_ms: default_probe_timeout(),
            db_max_connections: default_db_max_connections(),
        }
    }
}

impl CheckerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        (self.probe_timeout_ms > 0).then(|| Duration::from_millis(self.probe_timeout_ms))
    }

    pub fn degraded_threshold(&self) -> Duration {
        Duration::from_millis(self.degraded_threshold_ms)
    }
}

/// Values that must come from the environment and never from the config file.
#[derive(Clone)]
pub struct Secrets {
    pub api_key: String,
    pub database_url: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

impl Secrets {
    /// Export variables from a dotenv file into the process environment.
    /// Variables already set win. A missing or unreadable file is not fatal.
    pub fn load_dotenv(path: &Path) -> bool {
        info!("Loading environment variables from {}", path.display());
        match dotenvy::from_path(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error loading environment variables from {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            bail!("API_KEY is not set");
        }
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("SECRET_XATA_PG_ENDPOINT"))
            .filter(|v| !v.is_empty())
            .context("DATABASE_URL (or SECRET_XATA_PG_ENDPOINT) is not set")?;
        Ok(Self { api_key, database_url })
    }
}
