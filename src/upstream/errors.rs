use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One row of the static error table: how a known upstream error code is
/// presented to the caller.
pub struct ErrorMappingEntry {
    pub kind: &'static str,
    pub category: &'static str,
    pub message: &'static str,
    pub suggestion: &'static str,
}

/// Upstream error codes mapped to human-readable diagnostics. Built once,
/// read-only, safe for unsynchronized concurrent lookups.
pub static ERROR_MAP: Lazy<HashMap<&'static str, ErrorMappingEntry>> = Lazy::new(|| {
    HashMap::from([
        (
            "-1",
            ErrorMappingEntry {
                kind: "AUTHENTICATION",
                category: "AUTH_ERROR",
                message: "Invalid API key or signature",
                suggestion: "Check the API credentials configured for the upstream account",
            },
        ),
        (
            "-2",
            ErrorMappingEntry {
                kind: "INSUFFICIENT_BALANCE",
                category: "BALANCE_ERROR",
                message: "Insufficient funds",
                suggestion: "Deposit more funds to your account",
            },
        ),
        (
            "3203",
            ErrorMappingEntry {
                kind: "INVALID_PARAMETER",
                category: "PARAM_ERROR",
                message: "Incorrect order quantity",
                suggestion: "Quantity must match stepSize precision",
            },
        ),
        (
            "3204",
            ErrorMappingEntry {
                kind: "INVALID_PARAMETER",
                category: "PARAM_ERROR",
                message: "Minimum notional not met",
                suggestion: "Increase order size to meet the exchange minimum notional",
            },
        ),
        (
            "027037",
            ErrorMappingEntry {
                kind: "UPSTREAM_INTERNAL",
                category: "UPSTREAM_ERROR",
                message: "Upstream internal error",
                suggestion: "Check: API key active, account verified, IP whitelisted, sufficient balance",
            },
        ),
        (
            "-1003",
            ErrorMappingEntry {
                kind: "RATE_LIMIT_EXCEEDED",
                category: "RATE_LIMIT",
                message: "Too many requests",
                suggestion: "Wait 60 seconds before retrying",
            },
        ),
        (
            "4001",
            ErrorMappingEntry {
                kind: "MARKET_CLOSED",
                category: "MARKET_ERROR",
                message: "Trading suspended",
                suggestion: "Market maintenance in progress, try again later",
            },
        ),
        (
            "4002",
            ErrorMappingEntry {
                kind: "INVALID_SYMBOL",
                category: "MARKET_ERROR",
                message: "Symbol not found",
                suggestion: "Check available trading pairs at /open/v1/common/symbols",
            },
        ),
    ])
});

/// Uniform error payload sent to the caller for every failure category.
#[derive(Debug, Serialize)]
pub struct NormalizedError {
    pub code: i64,
    pub msg: String,
    pub data: ErrorData,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    #[serde(rename = "errorData")]
    pub error_data: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub reason: String,
    pub suggestion: String,
    #[serde(rename = "originalResponse", skip_serializing_if = "Option::is_none")]
    pub original_response: Option<Value>,
}

fn code_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Re-shape an upstream error body into the normalized diagnostic payload.
/// The code is looked up in `ERROR_MAP`; unknown codes get a synthesized
/// UNKNOWN entry embedding the original code.
pub fn normalize_error(body: &Value) -> NormalizedError {
    let code = body
        .get("code")
        .and_then(code_as_string)
        .or_else(|| {
            body.get("data")
                .and_then(|data| data.get("code"))
                .and_then(code_as_string)
        })
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let raw_msg = body
        .get("msg")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("data")
                .and_then(|data| data.get("errorData"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .to_string();

    let (kind, category, message, suggestion) = match ERROR_MAP.get(code.as_str()) {
        Some(entry) => (
            entry.kind.to_string(),
            entry.category.to_string(),
            entry.message.to_string(),
            entry.suggestion.to_string(),
        ),
        None => (
            "UNKNOWN".to_string(),
            "UNKNOWN_ERROR".to_string(),
            format!("Unmapped error code: {code}"),
            "Contact support with this error code".to_string(),
        ),
    };

    let error_data = if raw_msg.is_empty() {
        message.clone()
    } else {
        format!("{message} - {raw_msg}")
    };
    let reason = if raw_msg.is_empty() {
        format!("Upstream error code {code}")
    } else {
        raw_msg
    };

    NormalizedError {
        code: code.parse().unwrap_or(-1),
        msg: format!("{category}: {message}"),
        data: ErrorData {
            status: "ERROR",
            kind,
            code,
            error_data,
            details: ErrorDetails {
                reason,
                suggestion,
                original_response: Some(body.clone()),
            },
        },
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// Synthesized payload for the case where no response was received at all.
pub fn unreachable_error(timeout: bool) -> NormalizedError {
    NormalizedError {
        code: -9999,
        msg: "PROXY_ERROR: Connection timeout".to_string(),
        data: ErrorData {
            status: "ERROR",
            kind: "UPSTREAM_ERROR".to_string(),
            code: "PROXY_001".to_string(),
            error_data: "Could not reach upstream API servers".to_string(),
            details: ErrorDetails {
                reason: if timeout {
                    "Connection timeout after 30 seconds".to_string()
                } else {
                    "Network error".to_string()
                },
                suggestion: "The upstream API may be experiencing issues. Try again later."
                    .to_string(),
                original_response: None,
            },
        },
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// Synthesized payload for failures inside the relay itself.
pub fn internal_error(detail: &str) -> NormalizedError {
    NormalizedError {
        code: -9999,
        msg: "PROXY_ERROR: Internal server error".to_string(),
        data: ErrorData {
            status: "ERROR",
            kind: "INTERNAL_ERROR".to_string(),
            code: "PROXY_002".to_string(),
            error_data: format!("Proxy server error: {detail}"),
            details: ErrorDetails {
                reason: detail.to_string(),
                suggestion: "Contact system administrator".to_string(),
                original_response: None,
            },
        },
        timestamp: Utc::now().timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_mapped_code_yields_its_table_entry() {
        for (code, entry) in ERROR_MAP.iter() {
            let normalized = normalize_error(&json!({ "code": code, "msg": "" }));
            assert_eq!(normalized.data.kind, entry.kind, "code {code}");
            assert_eq!(
                normalized.data.details.suggestion, entry.suggestion,
                "code {code}"
            );
            assert_eq!(normalized.data.code, *code);
        }
    }

    #[test]
    fn unknown_code_falls_back_to_unknown_entry() {
        let normalized = normalize_error(&json!({ "code": 99999 }));
        assert_eq!(normalized.data.kind, "UNKNOWN");
        assert!(normalized.msg.starts_with("UNKNOWN_ERROR:"));
        assert!(normalized.msg.contains("99999"));
        assert_eq!(normalized.code, 99999);
    }

    #[test]
    fn missing_code_defaults_to_unknown_literal() {
        let normalized = normalize_error(&json!({ "msg": "something broke" }));
        assert_eq!(normalized.data.code, "UNKNOWN");
        assert_eq!(normalized.code, -1);
        assert_eq!(normalized.data.details.reason, "something broke");
    }

    #[test]
    fn code_is_read_from_nested_data_block() {
        let normalized = normalize_error(&json!({
            "data": { "code": "-2", "errorData": "balance too low" }
        }));
        assert_eq!(normalized.data.kind, "INSUFFICIENT_BALANCE");
        assert_eq!(normalized.code, -2);
        assert_eq!(
            normalized.data.error_data,
            "Insufficient funds - balance too low"
        );
    }

    #[test]
    fn numeric_code_is_coerced_to_string() {
        let normalized = normalize_error(&json!({ "code": -1003 }));
        assert_eq!(normalized.data.code, "-1003");
        assert_eq!(normalized.data.kind, "RATE_LIMIT_EXCEEDED");
        assert_eq!(normalized.code, -1003);
    }

    #[test]
    fn raw_message_is_appended_after_separator() {
        let normalized = normalize_error(&json!({ "code": -2, "msg": "acct 123" }));
        assert_eq!(normalized.data.error_data, "Insufficient funds - acct 123");
        assert_eq!(normalized.data.details.reason, "acct 123");
    }

    #[test]
    fn empty_message_generates_default_reason() {
        let normalized = normalize_error(&json!({ "code": "4001" }));
        assert_eq!(normalized.data.details.reason, "Upstream error code 4001");
        assert_eq!(normalized.data.error_data, "Trading suspended");
    }

    #[test]
    fn original_body_is_preserved_for_diagnostics() {
        let body = json!({ "code": -1, "msg": "bad sig", "extra": [1, 2] });
        let normalized = normalize_error(&body);
        assert_eq!(normalized.data.details.original_response, Some(body));
        assert_eq!(normalized.data.status, "ERROR");
        assert!(normalized.timestamp > 0);
    }

    #[test]
    fn unreachable_reason_distinguishes_timeout_from_network() {
        let timed_out = unreachable_error(true);
        assert_eq!(timed_out.code, -9999);
        assert_eq!(timed_out.data.kind, "UPSTREAM_ERROR");
        assert_eq!(timed_out.data.code, "PROXY_001");
        assert!(timed_out.data.details.reason.contains("timeout"));

        let network = unreachable_error(false);
        assert_eq!(network.data.details.reason, "Network error");
    }

    #[test]
    fn internal_error_embeds_failure_text() {
        let err = internal_error("TARGET_URL is not configured");
        assert_eq!(err.code, -9999);
        assert_eq!(err.data.kind, "INTERNAL_ERROR");
        assert_eq!(err.data.code, "PROXY_002");
        assert!(err.data.error_data.contains("TARGET_URL is not configured"));
    }

    #[test]
    fn serialized_shape_uses_wire_field_names() {
        let normalized = normalize_error(&json!({ "code": -2 }));
        let wire = serde_json::to_value(&normalized).unwrap();
        assert!(wire["data"]["errorData"].is_string());
        assert!(wire["data"]["type"].is_string());
        assert!(wire["data"]["details"]["originalResponse"].is_object());
        assert!(wire["timestamp"].is_i64());
    }
}
