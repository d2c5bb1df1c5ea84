use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failure modes at the core boundary. The HTTP layer maps each variant to a
/// status code instead of collapsing every failure into a 500.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any I/O was attempted.
    #[error("{0}")]
    Validation(String),

    /// Upstream provider unreachable, non-success status, or malformed body.
    #[error("upstream provider error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Cache store read or write failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
