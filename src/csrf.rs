//! CSRF request configuration.
//!
//! DESIGN
//! ======
//! The token is resolved once (explicit value, cookie string, or a bootstrap
//! `GET /`) and injected into every client that submits state-changing
//! requests. It does not expire within a session, so it is never refreshed.
//! Safe methods and cross-origin targets never carry the token.

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Url};
use tracing::{info, warn};

use crate::config::{ClientConfig, ConfigError};

/// Header Django reads the token from.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Methods defined to have no side effects; exempt from CSRF protection.
#[must_use]
pub fn is_safe_method(method: &Method) -> bool {
    matches!(method.as_str(), "GET" | "HEAD" | "OPTIONS" | "TRACE")
}

/// Extract a named cookie from a raw `Cookie` header (`a=1; b=2`).
#[must_use]
pub fn token_from_cookie_header(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
    })
}

/// Extract a named cookie from `Set-Cookie` header values. Attributes after
/// the first `;` (path, expiry, flags) are ignored.
pub fn token_from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>, name: &str) -> Option<String> {
    values.into_iter().find_map(|value| {
        let first = value.split(';').next()?;
        token_from_cookie_header(first, name)
    })
}

// =============================================================================
// REQUEST CONFIG
// =============================================================================

/// Request settings shared by every form submission of a session.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    base: Url,
    cookie_name: String,
    token: Option<String>,
}

impl RequestConfig {
    #[must_use]
    pub fn new(base: Url, cookie_name: impl Into<String>, token: Option<String>) -> Self {
        Self { base, cookie_name: cookie_name.into(), token }
    }

    /// Build from config without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL does not parse.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base = parse_base(&config.base_url)?;
        Ok(Self::new(base, config.csrf_cookie_name.clone(), config.csrf_token.clone()))
    }

    /// Resolve the token once at startup. An explicit token in `config` wins;
    /// otherwise `GET <base>/` is issued and the cookie read from `Set-Cookie`.
    /// A response without the cookie yields a config with no token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CsrfBootstrap`] if the bootstrap request fails.
    pub async fn bootstrap(http: &reqwest::Client, config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut request_config = Self::from_config(config)?;
        if request_config.token.is_some() {
            return Ok(request_config);
        }

        let url = config.url("/");
        let response = http
            .get(&url)
            .send()
            .await
            .map_err(|e| ConfigError::CsrfBootstrap(e.to_string()))?;
        let values = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        request_config.token = token_from_set_cookie(values, &config.csrf_cookie_name);

        if request_config.token.is_some() {
            info!(%url, "csrf token bootstrapped");
        } else {
            warn!(%url, cookie = %config.csrf_cookie_name, "no csrf cookie in bootstrap response");
        }
        Ok(request_config)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a form action (absolute or site-relative) against the base.
    ///
    /// # Errors
    ///
    /// Returns the parse error message if the action cannot be joined.
    pub fn resolve(&self, action: &str) -> Result<Url, String> {
        self.base.join(action).map_err(|e| e.to_string())
    }

    /// Whether a request to `url` with `method` must carry the token.
    #[must_use]
    pub fn needs_token(&self, method: &Method, url: &Url) -> bool {
        !is_safe_method(method) && url.origin() == self.base.origin()
    }

    /// Attach the token header and matching cookie when required.
    #[must_use]
    pub fn apply(&self, builder: RequestBuilder, method: &Method, url: &Url) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) if self.needs_token(method, url) => builder
                .header(CSRF_HEADER, token)
                .header(COOKIE, format!("{}={token}", self.cookie_name)),
            _ => builder,
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    // Trailing slash keeps `join` from dropping the last path segment.
    let with_slash = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&with_slash).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))
}

#[cfg(test)]
#[path = "csrf_test.rs"]
mod tests;
