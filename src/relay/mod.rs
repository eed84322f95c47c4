use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::AppError,
    upstream::{classify, normalize_error, unreachable_error, Classification, TransportOutcome},
};

mod client;
pub use client::CLIENT;
pub mod headers;

/// Full relay pipeline for one inbound request: build the outbound call,
/// issue it (single attempt), classify the outcome, shape the response.
pub async fn relay_request_to_upstream(
    config: Arc<AppConfig>,
    mut original_request: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let target_url = config
        .target_url
        .as_deref()
        .ok_or(AppError::TargetNotConfigured)?;

    let request_id = Uuid::new_v4();
    let method = original_request.method().clone();
    let path = original_request.uri().path().to_string();
    let query = original_request
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();

    info!(%request_id, %method, %path, query = %query.trim_start_matches('?'), "incoming relay request");

    let inbound_headers = original_request.headers().clone();
    let body = std::mem::replace(original_request.body_mut(), Body::empty());
    let body_bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(AppError::AxumError)?;

    // Query string is appended verbatim, no re-encoding.
    let url = format!("{target_url}{path}{query}");
    let outbound_headers = config.identity_mode.build_headers(&inbound_headers, target_url);
    let prepared_body = prepare_body(&method, &inbound_headers, body_bytes)?;

    debug!(
        %request_id,
        %url,
        credential = inbound_headers.contains_key(headers::API_KEY_HEADER),
        "forwarding to upstream"
    );

    let outcome = match CLIENT
        .request(method, &url)
        .headers(outbound_headers)
        .body(prepared_body)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            debug!(%request_id, %status, "upstream responded");
            let content_type = header_value(&response, header::CONTENT_TYPE);
            let content_encoding = header_value(&response, header::CONTENT_ENCODING);
            let raw = response.bytes().await?;
            UpstreamExchange::received(status, content_type, content_encoding, raw)
        }
        Err(e) => {
            error!(%request_id, error = %e, "no response from upstream");
            UpstreamExchange::failed(e.is_timeout())
        }
    };

    Ok(shape_response(request_id, outcome))
}

fn header_value(response: &reqwest::Response, name: http::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// One completed (or failed) outbound exchange, holding the raw body next to
/// the parsed view the classifier consumes.
struct UpstreamExchange {
    outcome: TransportOutcome,
    content_type: Option<String>,
    content_encoding: Option<String>,
    raw_body: Bytes,
}

impl UpstreamExchange {
    fn received(
        status: StatusCode,
        content_type: Option<String>,
        content_encoding: Option<String>,
        raw_body: Bytes,
    ) -> Self {
        let body = content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"))
            .then(|| serde_json::from_slice::<Value>(&raw_body).ok())
            .flatten();
        Self {
            outcome: TransportOutcome::Response { status, body },
            content_type,
            content_encoding,
            raw_body,
        }
    }

    fn failed(timeout: bool) -> Self {
        Self {
            outcome: TransportOutcome::Failed { timeout },
            content_type: None,
            content_encoding: None,
            raw_body: Bytes::new(),
        }
    }
}

fn shape_response(request_id: Uuid, exchange: UpstreamExchange) -> Response<Body> {
    match classify(&exchange.outcome) {
        Classification::Success => {
            debug!(%request_id, "relaying upstream response unchanged");
            let TransportOutcome::Response { status, .. } = exchange.outcome else {
                unreachable!("success classification implies a received response");
            };
            let content_type = exchange
                .content_type
                .as_deref()
                .unwrap_or("application/json");
            let mut builder = Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, content_type);
            // Compressed upstream bodies pass through undecoded; the caller
            // needs the encoding to make sense of them.
            if let Some(encoding) = exchange.content_encoding.as_deref() {
                builder = builder.header(header::CONTENT_ENCODING, encoding);
            }
            builder
                .body(Body::from(exchange.raw_body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Classification::LogicalError => {
            let TransportOutcome::Response { status, body } = exchange.outcome else {
                unreachable!("logical error classification implies a received response");
            };
            // Non-JSON error bodies are preserved as a string value.
            let body = body.unwrap_or_else(|| {
                Value::String(String::from_utf8_lossy(&exchange.raw_body).into_owned())
            });
            let normalized = normalize_error(&body);
            warn!(
                %request_id,
                %status,
                code = %normalized.data.code,
                kind = %normalized.data.kind,
                "upstream signaled an error"
            );
            (status, Json(normalized)).into_response()
        }
        Classification::Unreachable { timeout } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(unreachable_error(timeout)),
        )
            .into_response(),
    }
}

/// GET and HEAD carry no body; form-encoded bodies are parsed and
/// re-serialized rather than forwarded as raw bytes.
fn prepare_body(method: &Method, headers: &HeaderMap, body: Bytes) -> Result<Bytes, AppError> {
    if method == Method::GET || method == Method::HEAD || body.is_empty() {
        return Ok(Bytes::new());
    }

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return Ok(body);
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::MalformedRequest(format!("invalid form body: {e}")))?;
    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|e| AppError::MalformedRequest(format!("invalid form body: {e}")))?;
    Ok(Bytes::from(encoded))
}
