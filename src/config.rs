//! Client configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::monitor::DEFAULT_POLL_INTERVAL;

pub const API_BASE_URL_VAR: &str = "PREDICT_API_BASE_URL";
pub const POLL_INTERVAL_VAR: &str = "PREDICT_POLL_INTERVAL_MS";
pub const REQUEST_TIMEOUT_VAR: &str = "PREDICT_REQUEST_TIMEOUT_MS";

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the prediction service, without trailing slash
    pub api_base_url: Option<String>,
    /// Delay between status fetches
    pub poll_interval_ms: u64,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_BASE_URL_VAR) {
            config = config.with_base_url(url);
        }
        if let Some(raw) = lookup(POLL_INTERVAL_VAR) {
            config.poll_interval_ms = parse_millis(POLL_INTERVAL_VAR, &raw)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout_ms = parse_millis(REQUEST_TIMEOUT_VAR, &raw)?;
        }

        Ok(config)
    }

    /// Set the base URL, dropping trailing slashes. Blank values unset it.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        self.api_base_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url
            .as_deref()
            .ok_or(ConfigError::Missing(API_BASE_URL_VAR))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}
