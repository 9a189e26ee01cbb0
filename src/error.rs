//! Request-level failures and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::engine::BatchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request method")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Error generating response")]
    Serialization(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidBody(_) | ApiError::Batch(_) => StatusCode::BAD_REQUEST,
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::InvalidBody(e) => warn!("Rejected request: {}: {}", self, e),
            ApiError::Serialization(e) => error!("{}: {}", self, e),
            ApiError::Batch(BatchError::TooManyTargets { count, max }) => {
                warn!(count, max, "Rejected oversized batch")
            }
            _ => warn!("Rejected request: {}", self),
        }
        (status, self.to_string()).into_response()
    }
}
