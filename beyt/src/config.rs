//! HTTP client configuration
//!
//! Defaults work against a local API; `ClientConfig::from_env` lets the
//! deployment override them. Page size is not configurable (see `session`).

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_USER_AGENT: &str = concat!("beyt/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Request timeout; `None` keeps the HTTP client's default (no timeout)
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from `BEYT_API_BASE_URL` and `BEYT_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let timeout_secs: u64 = try_load("BEYT_HTTP_TIMEOUT_SECS", 0);
        Self {
            base_url: try_load("BEYT_API_BASE_URL", DEFAULT_BASE_URL.to_string()),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Some(raw) => parse_or_default(key, &raw, default),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn parse_or_default<T: FromStr + Display>(key: &str, raw: &str, default: T) -> T
where
    T::Err: Display,
{
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
