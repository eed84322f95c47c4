use axum::http::StatusCode;
use serde_json::Value;

/// What the outbound exchange produced, reduced to the inputs classification
/// needs. Built by the relay from the reqwest result.
#[derive(Debug)]
pub enum TransportOutcome {
    /// A response came back, whatever its status. `body` is the parsed JSON
    /// payload when the content type indicated JSON.
    Response {
        status: StatusCode,
        body: Option<Value>,
    },
    /// The call itself failed with no response received.
    Failed { timeout: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Relay the upstream response unchanged.
    Success,
    /// Transport succeeded but the upstream signaled an application-level
    /// failure, possibly inside an HTTP 200.
    LogicalError,
    /// No response at all: timeout, refused connection, DNS failure.
    Unreachable { timeout: bool },
}

/// Pure three-way decision over the transport outcome, first match wins:
/// unreachable, then any error signal (non-zero `code` field, `status` of
/// "ERROR", or a non-200 HTTP status), then success.
pub fn classify(outcome: &TransportOutcome) -> Classification {
    match outcome {
        TransportOutcome::Failed { timeout } => Classification::Unreachable { timeout: *timeout },
        TransportOutcome::Response { status, body } => {
            if *status != StatusCode::OK {
                return Classification::LogicalError;
            }
            let Some(body) = body else {
                return Classification::Success;
            };
            if body.get("status").and_then(Value::as_str) == Some("ERROR") {
                return Classification::LogicalError;
            }
            match body.get("code") {
                None => Classification::Success,
                Some(code) if code.as_i64() == Some(0) => Classification::Success,
                Some(_) => Classification::LogicalError,
            }
        }
    }
}
