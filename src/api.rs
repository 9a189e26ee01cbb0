use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::engine::Checker;
use crate::error::ApiError;
use crate::models::CheckRequest;

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<Checker>,
    pub api_key: Arc<str>,
}

fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented.is_empty() || presented != expected {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

pub async fn check_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    authorize(&headers, &state.api_key)?;

    let request: CheckRequest = serde_json::from_slice(&body).map_err(ApiError::InvalidBody)?;
    let results = state.checker.run_batch(&request.region, request.urls).await?;

    let payload = serde_json::to_vec(&results).map_err(ApiError::Serialization)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

async fn reject_method() -> ApiError {
    ApiError::MethodNotAllowed
}

pub fn create_router(state: AppState) -> Router {
    let check = post(check_batch).fallback(reject_method);
    Router::new()
        .route("/api", check.clone())
        .route("/api/check", check)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Uptime checker listening on http://localhost:{}", addr.port());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received. Closing uptime checker...");
        })
        .await?;
    Ok(())
}
