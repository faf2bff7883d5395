//! Provider configuration
//!
//! The library never reads the environment; only the binary calls
//! [`ProviderConfig::from_env`].

use crate::retry::Backoff;
use std::time::Duration;

/// Default Platform API endpoint
pub const DEFAULT_API_URL: &str = "https://api.cast.ai";

/// Default time allowed for a cluster to reach `archived`
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default time allowed for retried writes
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default status polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_token: String,
    /// Deadline for the cluster delete loop
    pub delete_timeout: Duration,
    /// Deadline for retried REST writes
    pub update_timeout: Duration,
    /// Deadline for SSO connections to become active
    pub sso_timeout: Duration,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Backoff between retried REST writes
    pub write_backoff: Backoff,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: String::new(),
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
            update_timeout: DEFAULT_UPDATE_TIMEOUT,
            sso_timeout: DEFAULT_UPDATE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_backoff: Backoff::rest_writes(),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables
    ///
    /// Uses:
    /// - `CASTAI_API_URL` (falls back to the public endpoint)
    /// - `CASTAI_API_TOKEN`
    /// - `CASTAI_DELETE_TIMEOUT_SECS`, `CASTAI_POLL_INTERVAL_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            api_url: lookup("CASTAI_API_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: lookup("CASTAI_API_TOKEN").unwrap_or_default(),
            delete_timeout: secs("CASTAI_DELETE_TIMEOUT_SECS", DEFAULT_DELETE_TIMEOUT),
            poll_interval: secs("CASTAI_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL),
            ..Self::default()
        }
    }

    pub fn polling_backoff(&self) -> Backoff {
        Backoff::Constant(self.poll_interval)
    }
}
