//! Fakes shared by the unit tests: in-memory stores and a local HTTP site.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::models::CheckResult;
use crate::store::{StoreError, UptimeStore};

#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<Vec<CheckResult>>,
}

impl RecordingStore {
    pub fn recorded(&self) -> Vec<CheckResult> {
        self.records.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl UptimeStore for RecordingStore {
    async fn record(&self, result: &CheckResult) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Rejects writes for one website and accepts the rest.
pub struct FailingStore {
    failing_id: Uuid,
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new(failing_id: Uuid) -> Self {
        Self { failing_id, attempts: AtomicUsize::new(0) }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UptimeStore for FailingStore {
    async fn record(&self, result: &CheckResult) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if result.website_id == self.failing_id {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub struct TestSite {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl TestSite {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn ok(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    "ok"
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    "slow"
}

async fn hang(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

async fn fail(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Serve `/ok`, `/slow`, `/hang` and `/error` on an ephemeral local port.
pub async fn spawn_site() -> TestSite {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/ok", get(ok))
        .route("/slow", get(slow))
        .route("/hang", get(hang))
        .route("/error", get(fail))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestSite { base: format!("http://{}", addr), hits }
}

/// A URL on a port that was just released, so connecting is refused.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}
