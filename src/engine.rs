use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::CheckerConfig;
use crate::models::{CheckResult, CheckTarget, Status};
use crate::store::UptimeStore;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("Too many URLs, maximum allowed is {max}")]
    TooManyTargets { count: usize, max: usize },
}

/// Runs one bounded batch of probes per call and hands every result to the store.
pub struct Checker {
    http_client: reqwest::Client,
    store: Arc<dyn UptimeStore>,
    degraded_threshold: Duration,
    max_batch_size: usize,
}

impl Checker {
    pub fn new(config: &CheckerConfig, store: Arc<dyn UptimeStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.probe_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            store,
            degraded_threshold: config.degraded_threshold(),
            max_batch_size: config.max_batch_size,
        })
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn validate(&self, targets: &[CheckTarget]) -> Result<(), BatchError> {
        if targets.len() > self.max_batch_size {
            return Err(BatchError::TooManyTargets {
                count: targets.len(),
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    /// Probe every target, persist each result, and return them in completion order.
    ///
    /// Probe and store failures never fail the batch; only an oversized batch does,
    /// and it is rejected before anything is probed or written.
    pub async fn run_batch(&self, region: &str, targets: Vec<CheckTarget>) -> Result<Vec<CheckResult>, BatchError> {
        self.validate(&targets)?;

        let start_time = Utc::now();
        let total = targets.len();
        let results = self.probe_all(targets).await;

        for result in &results {
            info!(
                website_id = %result.website_id,
                url = %result.url,
                status = result.status.as_str(),
                status_code = result.status_code,
                response_time_ms = result.response_time_ms,
                "Check completed"
            );
            if let Err(e) = self.store.record(result).await {
                error!(website_id = %result.website_id, "Error inserting result into database: {}", e);
            }
        }

        let duration = Utc::now() - start_time;
        info!(
            region,
            "Batch completed {} checks in {:.2}s.",
            total,
            duration.num_milliseconds() as f64 / 1000.0
        );
        Ok(results)
    }

    async fn probe_all(&self, targets: Vec<CheckTarget>) -> Vec<CheckResult> {
        let client = self.http_client.clone();
        let threshold = self.degraded_threshold;
        fan_out(targets, move |target| {
            let client = client.clone();
            async move { probe(&client, &target, threshold).await }
        })
        .await
    }
}

/// Run `check` once per target on its own task, wait for all of them, then drain the results.
///
/// A task that panics still yields a `Down` result for its target.
pub async fn fan_out<F, Fut>(targets: Vec<CheckTarget>, check: F) -> Vec<CheckResult>
where
    F: Fn(CheckTarget) -> Fut,
    Fut: Future<Output = CheckResult> + Send + 'static,
{
    let total = targets.len();
    let (tx, mut rx) = mpsc::channel(total.max(1));
    let mut tasks = FuturesUnordered::new();

    for target in targets {
        let tx = tx.clone();
        let fallback = target.clone();
        let pending = check(target);

        let handle = tokio::spawn(async move {
            let result = pending.await;
            // Capacity equals the batch size, so this never waits on the reader.
            let _ = tx.send(result).await;
        });
        tasks.push(async move { (fallback, handle.await) });
    }
    drop(tx);

    let mut lost = Vec::new();
    while let Some((target, join_res)) = tasks.next().await {
        if let Err(e) = join_res {
            error!(website_id = %target.website_id, "Probe task failed: {}", e);
            lost.push(CheckResult::down(&target, 0));
        }
    }

    let mut results = Vec::with_capacity(total);
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results.extend(lost);
    results
}

/// GET the target once and classify the outcome. Transport errors become `Down`.
pub async fn probe(client: &reqwest::Client, target: &CheckTarget, degraded_threshold: Duration) -> CheckResult {
    let start = Instant::now();
    let outcome = client.get(&target.url).send().await;
    let response_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(response) => {
            let status_code = response.status().as_u16();
            drop(response);
            CheckResult {
                website_id: target.website_id,
                url: target.url.clone(),
                status: classify(response_time_ms, degraded_threshold),
                status_code,
                response_time_ms,
            }
        }
        Err(e) => {
            debug!(url = %target.url, "Probe failed: {}", e);
            CheckResult::down(target, response_time_ms)
        }
    }
}

pub fn classify(response_time_ms: u64, degraded_threshold: Duration) -> Status {
    if u128::from(response_time_ms) > degraded_threshold.as_millis() {
        Status::Degraded
    } else {
        Status::Up
    }
}
