//! Client configuration.
//!
//! Defaults match a backend running locally; hosts override them in code
//! or through the environment (see [`ClientConfig::from_env`]).

use std::env;
use std::time::Duration;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Per-request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the versioned API, e.g. `https://docs.example.com/api/v1`.
    /// Endpoint paths are joined onto it.
    pub base_url: String,

    /// Applied to every request by the HTTP client. There is no retry.
    pub timeout: Duration,

    /// Sent as `User-Agent`.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("docqa/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

impl ClientConfig {
    /// A default config pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `DOCQA_API_URL` and `DOCQA_TIMEOUT_SECS`, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("DOCQA_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        if let Ok(raw) = env::var("DOCQA_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    config.timeout = Duration::from_secs(secs);
                }
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid DOCQA_TIMEOUT_SECS"
                ),
            }
        }

        config
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
