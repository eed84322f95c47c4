use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http::status::InvalidStatusCode;

use crate::upstream::{internal_error, unreachable_error};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request to upstream failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Axum error: {0}")]
    AxumError(#[from] axum::Error),

    #[error("Invalid status code: {0}")]
    InvalidStatus(#[from] InvalidStatusCode),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TARGET_URL is not configured; set it in the environment")]
    TargetNotConfigured,

    #[error("Malformed inbound request: {0}")]
    MalformedRequest(String),
}

/// Every error that escapes the relay pipeline still renders as the
/// normalized JSON shape: 503 for transport failures, 500 for everything
/// attributable to the relay itself.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ReqwestError(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(unreachable_error(e.is_timeout())),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(internal_error(&self.to_string())),
            )
                .into_response(),
        }
    }
}
