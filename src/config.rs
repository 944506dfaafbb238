//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ErrorCode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CSRF_COOKIE_NAME: &str = "csrftoken";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_BANNER_HIDE_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// Fetching the CSRF cookie from the server failed.
    #[error("CSRF bootstrap failed: {0}")]
    CsrfBootstrap(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::CsrfBootstrap(_) => "E_CSRF_BOOTSTRAP",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::CsrfBootstrap(_))
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Site root, without trailing slash.
    pub base_url: String,
    /// Explicit CSRF token; when absent it is bootstrapped from the server.
    pub csrf_token: Option<String>,
    pub csrf_cookie_name: String,
    pub poll_interval: Duration,
    pub banner_hide_delay: Duration,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_token: None,
            csrf_cookie_name: DEFAULT_CSRF_COOKIE_NAME.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            banner_hide_delay: Duration::from_millis(DEFAULT_BANNER_HIDE_MS),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `HELLO_BASE_URL`: default `http://127.0.0.1:8000`
    /// - `HELLO_CSRF_TOKEN`: explicit token, wins over `HELLO_COOKIE`
    /// - `HELLO_COOKIE`: raw `Cookie` header to extract the token from
    /// - `HELLO_CSRF_COOKIE_NAME`: default `csrftoken`
    /// - `HELLO_POLL_INTERVAL_MS`: default 500
    /// - `HELLO_BANNER_HIDE_MS`: default 5000
    /// - `HELLO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `HELLO_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `HELLO_BASE_URL` is not an
    /// absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("HELLO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )?;
        let csrf_cookie_name =
            std::env::var("HELLO_CSRF_COOKIE_NAME").unwrap_or_else(|_| DEFAULT_CSRF_COOKIE_NAME.to_string());
        let csrf_token = std::env::var("HELLO_CSRF_TOKEN").ok().or_else(|| {
            std::env::var("HELLO_COOKIE")
                .ok()
                .and_then(|raw| crate::csrf::token_from_cookie_header(&raw, &csrf_cookie_name))
        });

        Ok(Self {
            base_url,
            csrf_token,
            csrf_cookie_name,
            poll_interval: Duration::from_millis(env_parse("HELLO_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)),
            banner_hide_delay: Duration::from_millis(env_parse("HELLO_BANNER_HIDE_MS", DEFAULT_BANNER_HIDE_MS)),
            timeouts: Timeouts {
                request_secs: env_parse("HELLO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("HELLO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        })
    }

    /// Replace the base URL, normalizing it the same way `from_env` does.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for relative or non-http URLs.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    /// Absolute URL for a site-relative path such as `/requests_ajax/`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build the shared HTTP client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClientBuild`] if the TLS backend fails to
    /// initialize.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(self.timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidBaseUrl(raw.to_string())),
    }
}

fn env_parse<T>(key: &str, default: T) -> T
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
