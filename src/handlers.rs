use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{config::AppConfig, relay::relay_request_to_upstream};

/// Static liveness payload, never routed into the relay.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "OK", "message": "Proxy server is running" }))
}

pub async fn relay_request(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
) -> Response {
    match relay_request_to_upstream(config, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Relay error: {e}");
            e.into_response()
        }
    }
}
