use once_cell::sync::Lazy;
use std::time::Duration;

/// Shared upstream HTTP client. Status validation stays off (reqwest default)
/// so every status code reaches the classifier instead of surfacing as a
/// transport error.
pub static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(32)
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
});
