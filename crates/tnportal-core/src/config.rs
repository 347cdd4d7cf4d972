//! API endpoint configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const BASE_URL_VAR: &str = "PUBLIC_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "PUBLIC_API_TIMEOUT";
pub const DEBUG_VAR: &str = "PUBLIC_API_DEBUG";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PUBLIC_API_BASE_URL is not defined, check your .env file")]
    MissingBaseUrl,
    #[error("PUBLIC_API_TIMEOUT must be a whole number of milliseconds, got {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Base URL without a trailing slash.
    pub api_base_url: String,
    /// Deadline for a whole request, including a streamed response.
    pub api_timeout: Duration,
    /// Log every request, response and SSE frame at debug level.
    pub debug: bool,
}

impl PortalConfig {
    pub fn new(api_base_url: impl Into<String>, api_timeout: Duration) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_timeout,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let timeout_ms = match lookup(TIMEOUT_VAR).map(|v| v.trim().to_string()) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            _ => DEFAULT_TIMEOUT_MS,
        };

        let debug = lookup(DEBUG_VAR).is_some_and(|v| is_truthy(&v));

        let config = Self::new(base_url, Duration::from_millis(timeout_ms)).with_debug(debug);
        tracing::debug!(
            base_url = %config.api_base_url,
            timeout_ms,
            debug = config.debug,
            "loaded API configuration"
        );
        Ok(config)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
