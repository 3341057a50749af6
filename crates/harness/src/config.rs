//! Harness configuration
//!
//! Loaded from environment variables, with `.env.test` and `.env` files
//! picked up when present.

use std::env;
use std::sync::Once;
use std::time::Duration;

use crate::error::{HarnessError, Result};

static DOTENV: Once = Once::new();

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin"; // pragma: allowlist secret

/// Where the target API lives and how to log in to it
#[derive(Clone)]
pub struct HarnessConfig {
    /// Base URL of the API under test, without a trailing slash
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout; `None` leaves the HTTP client's defaults in place
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl HarnessConfig {
    /// Config for `base_url` with the fixed admin credentials
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            request_timeout: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        DOTENV.call_once(|| {
            dotenvy::from_filename(".env.test").ok();
            dotenvy::dotenv().ok();
        });

        let base_url =
            env::var("IPM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(HarnessError::Configuration(
                "IPM_API_BASE_URL must not be empty".to_string(),
            ));
        }

        let request_timeout = match env::var("IPM_API_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    HarnessError::Configuration(format!(
                        "IPM_API_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(HarnessError::Configuration(
                        "IPM_API_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            base_url: normalize_base_url(base_url),
            username: env::var("IPM_API_USERNAME").unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
            password: env::var("IPM_API_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string()),
            request_timeout,
        })
    }

    /// Absolute URL for an API path such as `/users`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn normalize_base_url(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
