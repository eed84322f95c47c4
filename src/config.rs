use dotenv::dotenv;
use std::env;

use crate::relay::headers::IdentityMode;

pub struct AppConfig {
    pub port: u16,
    pub host: String,
    /// Base URL of the upstream API. When unset, every relay call fails with
    /// a misconfiguration diagnostic instead of hitting an empty host.
    pub target_url: Option<String>,
    pub identity_mode: IdentityMode,
}

impl AppConfig {
    pub fn new() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            target_url: env::var("TARGET_URL").ok().filter(|url| !url.is_empty()),
            identity_mode: IdentityMode::from_env(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
