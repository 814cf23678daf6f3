//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CARTWHEEL_API_URL` - Storefront backend base URL (default: `http://localhost:5000`)
//! - `CARTWHEEL_SESSION_FILE` - Where the sign-in token is persisted
//!   (default: `.cartwheel/session.json`)
//! - `CARTWHEEL_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CARTWHEEL_PRODUCT_CACHE_TTL_SECS` - Lifetime of cached product lookups
//!   used by the cart and order views; `0` disables the cache (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_SESSION_FILE: &str = ".cartwheel/session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid API URL {0}: {1}")]
    InvalidApiUrl(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront backend
    pub api_url: Url,
    /// File holding the persisted session (token, role, user id)
    pub session_file: PathBuf,
    /// Timeout applied to every backend request
    pub timeout: Duration,
    /// Lifetime of cached product lookups; zero disables caching
    pub product_cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("CARTWHEEL_API_URL", DEFAULT_API_URL))?;
        let session_file = PathBuf::from(get_env_or_default(
            "CARTWHEEL_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let timeout = Duration::from_secs(get_secs(
            "CARTWHEEL_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let product_cache_ttl = Duration::from_secs(get_secs(
            "CARTWHEEL_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            api_url,
            session_file,
            timeout,
            product_cache_ttl,
        })
    }

    /// Replace the persisted session location.
    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Replace the product cache lifetime.
    #[must_use]
    pub const fn with_product_cache_ttl(mut self, ttl: Duration) -> Self {
        self.product_cache_ttl = ttl;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a whole number of seconds, defaulting when unset.
fn get_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse and check the backend base URL.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidApiUrl(raw.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl(
            raw.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidApiUrl(
            raw.to_string(),
            "cannot be used as a base URL".to_string(),
        ));
    }
    Ok(url)
}
