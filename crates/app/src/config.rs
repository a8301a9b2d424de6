//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for the `PostgreSQL` backend
//! - `PIZZA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PIZZA_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `PIZZA_TOKEN_CACHE` - Local session mirror file (default: `.pizza-cafe/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_TOKEN_CACHE: &str = ".pizza-cafe/session.json";
const DEFAULT_MAX_CONNECTIONS: &str = "5";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Maximum pooled database connections
    pub db_max_connections: u32,
    /// Path of the local token cache file
    pub token_cache_path: PathBuf,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("token_cache_path", &self.token_cache_path)
            .field("sentry", &self.sentry)
            .finish()
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when unset
    pub dsn: Option<String>,
    /// Environment tag (e.g. "production")
    pub environment: Option<String>,
    /// Fraction of error events sent
    pub sample_rate: f32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PIZZA_DATABASE_URL");
        let db_max_connections = parse_env(
            "PIZZA_DB_MAX_CONNECTIONS",
            &get_env_or_default("PIZZA_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
        )?;
        let token_cache_path =
            PathBuf::from(get_env_or_default("PIZZA_TOKEN_CACHE", DEFAULT_TOKEN_CACHE));
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            database_url,
            db_max_connections,
            token_cache_path,
            sentry,
        })
    }

    /// The database URL, required by the `PostgreSQL` backends.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no URL was configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("PIZZA_DATABASE_URL".to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            token_cache_path: PathBuf::from(DEFAULT_TOKEN_CACHE),
            sentry: SentryConfig {
                sample_rate: 1.0,
                ..SentryConfig::default()
            },
        }
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sample_rate: f32 = parse_env(
            "SENTRY_SAMPLE_RATE",
            &get_env_or_default("SENTRY_SAMPLE_RATE", "1.0"),
        )?;
        if !(0.0..=1.0).contains(&sample_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "SENTRY_SAMPLE_RATE".to_string(),
                format!("must be between 0.0 and 1.0 (got {sample_rate})"),
            ));
        }

        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a raw value, naming the variable on failure.
fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
