//! Session client configuration.
//!
//! Defaults point at the development deployment of the API under test.
//! Override via environment variables or explicit construction for other
//! deployments and for tests.

use url::Url;
use zeroize::Zeroizing;

/// Base URL used when `API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://dev.api.apollo-group.io/venus-api";

/// Sign-in endpoint, relative to the base URL.
pub const DEFAULT_SIGN_IN_PATH: &str = "/auth/signin";

/// Configuration for [`crate::SessionClient`].
///
/// Custom `Debug` implementation redacts the password.
#[derive(Clone)]
pub struct SessionConfig {
    /// Prefix for every request URL; endpoint paths are appended verbatim.
    pub base_url: Url,
    /// Default: `/auth/signin`.
    pub sign_in_path: String,
    /// Account email. Absent credentials fail at sign-in, not here.
    pub email: Option<String>,
    pub password: Option<Zeroizing<String>>,
    /// Per-request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("sign_in_path", &self.sign_in_path)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SessionConfig {
    /// Configuration for `base_url` with no credentials and no timeout.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            email: None,
            password: None,
            timeout_secs: None,
        }
    }

    /// Parse `raw` as the base URL.
    pub fn for_base_url(raw: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
            source_name: "base URL".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(url))
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `API_BASE_URL` (default: `https://dev.api.apollo-group.io/venus-api`)
    /// - `AUTH_EMAIL`, `AUTH_PASSWORD` (optional here, required by sign-in)
    /// - `API_TIMEOUT_SECS` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(env_url("API_BASE_URL", DEFAULT_BASE_URL)?);
        config.email = std::env::var("AUTH_EMAIL").ok();
        config.password = std::env::var("AUTH_PASSWORD").ok().map(Zeroizing::new);
        config.timeout_secs = env_timeout("API_TIMEOUT_SECS")?;
        Ok(config)
    }

    pub fn with_credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    /// Full URL for an endpoint path such as `/auth/signin`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint
        )
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        source_name: var.to_string(),
        reason: e.to_string(),
    })
}

fn env_timeout(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidTimeout { value: raw }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {source_name}: {reason}")]
    InvalidUrl { source_name: String, reason: String },
    #[error("invalid timeout '{value}': expected whole seconds")]
    InvalidTimeout { value: String },
}
