use axum::{
    routing::{any, get},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod upstream;

use crate::config::AppConfig;

/// Build the application router: health check, the legacy `/proxy` path, and
/// a catch-all that relays any method on any path. All responses carry
/// `Access-Control-Allow-Origin: *` via the CORS layer.
pub fn app(config: Arc<AppConfig>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/proxy", any(handlers::relay_request))
        .route("/", any(handlers::relay_request))
        .route("/*path", any(handlers::relay_request))
        .with_state(config)
        .layer(cors)
}
