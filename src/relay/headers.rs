use axum::http::{header, HeaderMap, HeaderValue};
use std::env;
use tracing::debug;

/// Headers that disclose the original caller's network path. The outbound
/// request must never carry any of these, in either mode.
pub const IDENTITY_HEADERS: [&str; 7] = [
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
    "via",
];

/// The one credential header passed through to the upstream.
pub const API_KEY_HEADER: &str = "x-mbx-apikey";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How outbound headers are derived from inbound ones. The two modes are
/// mutually exclusive deployment choices, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Discard every inbound header and present a fixed browser-like
    /// identity. Used when the upstream runs bot detection and the relay
    /// must not look like a relay.
    Synthetic,
    /// Forward inbound headers, minus hop-by-hop and identity-revealing
    /// ones, backfilling browser defaults where absent.
    Transparent,
}

impl IdentityMode {
    pub fn from_env() -> Self {
        match env::var("IDENTITY_MODE").as_deref() {
            Ok("transparent") => IdentityMode::Transparent,
            _ => IdentityMode::Synthetic,
        }
    }

    pub fn build_headers(&self, inbound: &HeaderMap, target_url: &str) -> HeaderMap {
        match self {
            IdentityMode::Synthetic => synthetic_headers(inbound),
            IdentityMode::Transparent => transparent_headers(inbound, target_url),
        }
    }
}

/// Fresh header set as if this server itself were the client. Only the API
/// key and content type survive from the inbound request.
fn synthetic_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(BROWSER_USER_AGENT),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,id;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    if let Some(api_key) = inbound.get(API_KEY_HEADER) {
        debug!("forwarding credential header to upstream");
        headers.insert(API_KEY_HEADER, api_key.clone());
    }

    if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }

    headers
}

/// Inbound headers minus everything that reveals the relay or the original
/// client, with browser defaults backfilled.
fn transparent_headers(inbound: &HeaderMap, target_url: &str) -> HeaderMap {
    let mut headers = inbound.clone();

    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    for name in IDENTITY_HEADERS {
        headers.remove(name);
    }

    if !headers.contains_key(header::USER_AGENT) {
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(BROWSER_USER_AGENT),
        );
    }
    if !headers.contains_key(header::ACCEPT) {
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
    }
    if let Ok(origin) = HeaderValue::from_str(target_url) {
        if !headers.contains_key(header::ORIGIN) {
            headers.insert(header::ORIGIN, origin.clone());
        }
        if !headers.contains_key(header::REFERER) {
            headers.insert(header::REFERER, origin);
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound_with_identity_headers() -> HeaderMap {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        inbound.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));
        inbound.insert("x-client-ip", HeaderValue::from_static("10.0.0.1"));
        inbound.insert("via", HeaderValue::from_static("1.1 some-proxy"));
        inbound.insert("forwarded", HeaderValue::from_static("for=10.0.0.1"));
        inbound.insert("host", HeaderValue::from_static("relay.internal"));
        inbound.insert(API_KEY_HEADER, HeaderValue::from_static("secret-key"));
        inbound.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        inbound
    }

    #[test]
    fn synthetic_mode_never_leaks_identity_headers() {
        let outbound = IdentityMode::Synthetic
            .build_headers(&inbound_with_identity_headers(), "https://api.example.com");

        for name in IDENTITY_HEADERS {
            assert!(!outbound.contains_key(name), "leaked header: {name}");
        }
        assert!(!outbound.contains_key(header::HOST));
    }

    #[test]
    fn synthetic_mode_presents_browser_identity() {
        let outbound = IdentityMode::Synthetic
            .build_headers(&inbound_with_identity_headers(), "https://api.example.com");

        let ua = outbound.get(header::USER_AGENT).unwrap().to_str().unwrap();
        assert!(ua.contains("Mozilla/5.0"));
        assert_eq!(outbound.get(header::CONNECTION).unwrap(), "keep-alive");
    }

    #[test]
    fn synthetic_mode_copies_only_credential_and_content_type() {
        let inbound = inbound_with_identity_headers();
        let outbound =
            IdentityMode::Synthetic.build_headers(&inbound, "https://api.example.com");

        assert_eq!(outbound.get(API_KEY_HEADER).unwrap(), "secret-key");
        assert_eq!(
            outbound.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn synthetic_mode_omits_credential_when_absent() {
        let outbound =
            IdentityMode::Synthetic.build_headers(&HeaderMap::new(), "https://api.example.com");
        assert!(!outbound.contains_key(API_KEY_HEADER));
    }

    #[test]
    fn transparent_mode_strips_identity_and_hop_headers() {
        let outbound = IdentityMode::Transparent
            .build_headers(&inbound_with_identity_headers(), "https://api.example.com");

        for name in IDENTITY_HEADERS {
            assert!(!outbound.contains_key(name), "leaked header: {name}");
        }
        assert!(!outbound.contains_key(header::HOST));
        assert!(!outbound.contains_key(header::CONTENT_LENGTH));
    }

    #[test]
    fn transparent_mode_backfills_only_when_absent() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::USER_AGENT, HeaderValue::from_static("custom-agent"));

        let outbound =
            IdentityMode::Transparent.build_headers(&inbound, "https://api.example.com");

        assert_eq!(outbound.get(header::USER_AGENT).unwrap(), "custom-agent");
        assert_eq!(
            outbound.get(header::ORIGIN).unwrap(),
            "https://api.example.com"
        );
        assert_eq!(
            outbound.get(header::REFERER).unwrap(),
            "https://api.example.com"
        );
        assert!(outbound.contains_key(header::ACCEPT));
    }

    #[test]
    fn transparent_mode_preserves_unrelated_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-custom-tag", HeaderValue::from_static("keep-me"));

        let outbound =
            IdentityMode::Transparent.build_headers(&inbound, "https://api.example.com");
        assert_eq!(outbound.get("x-custom-tag").unwrap(), "keep-me");
    }
}
