//! Client configuration.
//!
//! Everything a WordPress page would have inlined into the widget (the
//! site root, the nonce, the default bot) comes from `BOTKIT_*`
//! environment variables here, with code defaults for the timeouts and
//! the poll cadence.

use crate::error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default delay between consecutive status requests.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_500;

/// Connection settings for one WordPress site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotkitConfig {
    /// Site root, e.g. `https://example.com`. No trailing slash.
    pub base_url: String,
    /// CSRF token minted server-side; opaque to the client.
    pub nonce: String,
    /// Default bot for chat submissions.
    pub bot_id: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl BotkitConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, nonce: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            nonce: nonce.into(),
            bot_id: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Build config from `BOTKIT_*` environment variables.
    ///
    /// Required: `BOTKIT_BASE_URL`, `BOTKIT_NONCE`. Optional:
    /// `BOTKIT_BOT_ID`, `BOTKIT_REQUEST_TIMEOUT_SECS`,
    /// `BOTKIT_CONNECT_TIMEOUT_SECS`, `BOTKIT_POLL_INTERVAL_MS`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = require_env("BOTKIT_BASE_URL")?;
        let nonce = require_env("BOTKIT_NONCE")?;

        let mut config = Self::new(base_url, nonce);
        config.bot_id = std::env::var("BOTKIT_BOT_ID").ok().filter(|v| !v.is_empty());
        config.request_timeout_secs =
            env_parse("BOTKIT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);
        config.connect_timeout_secs =
            env_parse("BOTKIT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS);
        config.poll_interval_ms = env_parse("BOTKIT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        Ok(config)
    }

    /// The admin-ajax endpoint every action posts to.
    #[must_use]
    pub fn ajax_url(&self) -> String {
        format!("{}/wp-admin/admin-ajax.php", self.base_url)
    }
}

fn require_env(key: &str) -> Result<String, ClientError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ClientError::InvalidConfig(format!("{key} not set")))
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
