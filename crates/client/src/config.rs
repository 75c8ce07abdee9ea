//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional; defaults match the development setup.
//!
//! - `VITALINK_API_URL` - Base URL of the service API
//!   (default: `http://localhost:8080/api`)
//! - `VITALINK_TOKEN_COOKIE` - Credential cookie name (default: `token`)
//! - `VITALINK_USER_COOKIE` - User-summary cookie name (default: `user`)
//! - `VITALINK_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `VITALINK_MAX_ATTEMPTS` - Dispatcher retry ceiling (default: 3)
//! - `VITALINK_TRANSPORT_RETRY_MS` - Fixed transport retry delay
//!   (default: 500)
//! - `VITALINK_RETRY_BASE_MS` - Base of the 5xx exponential backoff
//!   (default: 300)
//! - `VITALINK_PROTECTED_PREFIXES` - Comma-separated protected path
//!   prefixes (default: `/dashboard,/coach,/history,/profile,/donate,/map`)
//! - `VITALINK_AUTH_ONLY_PREFIXES` - Comma-separated auth-only path
//!   prefixes (default: `/login,/signup`)
//! - `VITALINK_LOGIN_PATH` - Sign-in path (default: `/login`)
//! - `VITALINK_LANDING_PATH` - Default authenticated landing path
//!   (default: `/dashboard`)

use std::time::Duration;

use thiserror::Error;

use crate::dispatch::RetryPolicy;
use crate::session::{DEFAULT_TOKEN_COOKIE, DEFAULT_USER_COOKIE};

/// Default base URL of the service API.
const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default fixed delay between transport-failure retries.
const DEFAULT_TRANSPORT_RETRY_MS: u64 = 500;

/// Default base of the 5xx exponential backoff.
const DEFAULT_RETRY_BASE_MS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Path lists and redirect targets for the route guard.
#[derive(Debug, Clone)]
pub struct GuardPaths {
    /// Prefixes that require a credential cookie.
    pub protected_prefixes: Vec<String>,
    /// Prefixes an identified caller is bounced away from.
    pub auth_only_prefixes: Vec<String>,
    /// Sign-in path, the target of unauthenticated redirects.
    pub login_path: String,
    /// Default landing path for already-identified callers.
    pub landing_path: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            protected_prefixes: parse_prefix_list(
                "/dashboard,/coach,/history,/profile,/donate,/map",
            ),
            auth_only_prefixes: parse_prefix_list("/login,/signup"),
            login_path: "/login".to_owned(),
            landing_path: "/dashboard".to_owned(),
        }
    }
}

/// Vitalink client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service API, without a trailing slash.
    pub api_url: String,
    /// Name of the credential cookie.
    pub token_cookie: String,
    /// Name of the user-summary cookie.
    pub user_cookie: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
    /// Dispatcher retry schedule.
    pub retry: RetryPolicy,
    /// Route guard paths.
    pub guard: GuardPaths,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token_cookie: DEFAULT_TOKEN_COOKIE.to_owned(),
            user_cookie: DEFAULT_USER_COOKIE.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            guard: GuardPaths::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse or the API
    /// URL is not an absolute HTTP(S) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let api_url = get_env_or_default("VITALINK_API_URL", DEFAULT_API_URL);
        validate_api_url(&api_url)?;

        let retry = RetryPolicy {
            max_attempts: get_parsed_or("VITALINK_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
            transport_delay: Duration::from_millis(get_parsed_or(
                "VITALINK_TRANSPORT_RETRY_MS",
                DEFAULT_TRANSPORT_RETRY_MS,
            )?),
            base_delay: Duration::from_millis(get_parsed_or(
                "VITALINK_RETRY_BASE_MS",
                DEFAULT_RETRY_BASE_MS,
            )?),
        };

        let guard = GuardPaths {
            protected_prefixes: std::env::var("VITALINK_PROTECTED_PREFIXES")
                .map_or(defaults.guard.protected_prefixes, |raw| {
                    parse_prefix_list(&raw)
                }),
            auth_only_prefixes: std::env::var("VITALINK_AUTH_ONLY_PREFIXES")
                .map_or(defaults.guard.auth_only_prefixes, |raw| {
                    parse_prefix_list(&raw)
                }),
            login_path: get_env_or_default("VITALINK_LOGIN_PATH", &defaults.guard.login_path),
            landing_path: get_env_or_default("VITALINK_LANDING_PATH", &defaults.guard.landing_path),
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            token_cookie: get_env_or_default("VITALINK_TOKEN_COOKIE", &defaults.token_cookie),
            user_cookie: get_env_or_default("VITALINK_USER_COOKIE", &defaults.user_cookie),
            request_timeout: Duration::from_secs(get_parsed_or(
                "VITALINK_REQUEST_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            retry,
            guard,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn get_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated prefix list, dropping empty entries.
fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Require an absolute HTTP(S) URL for the API base.
fn validate_api_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "VITALINK_API_URL".to_owned(),
            format!("expected an absolute http(s) URL, got '{url}'"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.token_cookie, "token");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.guard.login_path, "/login");
        assert!(
            config
                .guard
                .protected_prefixes
                .contains(&"/donate".to_owned())
        );
    }

    #[test]
    fn test_parse_prefix_list() {
        assert_eq!(
            parse_prefix_list("/a, /b,,/c"),
            vec!["/a".to_owned(), "/b".to_owned(), "/c".to_owned()]
        );
        assert!(parse_prefix_list("").is_empty());
    }

    #[test]
    fn test_validate_api_url() {
        assert!(validate_api_url("http://localhost:8080/api").is_ok());
        assert!(validate_api_url("https://api.vitalink.org").is_ok());
        assert!(validate_api_url("localhost:8080").is_err());
        assert!(validate_api_url("").is_err());
    }
}
