//! Command implementations.

pub mod customer;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

use pizza_cafe_app::AppError;
use pizza_cafe_app::config::ConfigError;

/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "PIZZA_PASSWORD";

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Customer command run without `--email`.
    #[error("--email is required for this command")]
    MissingEmail,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Seed file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for a menu.
    #[error("Invalid menu file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file content failed validation.
    #[error("Invalid menu file: {0}")]
    InvalidMenu(String),

    /// The user-facing flow refused the action.
    #[error("{0}")]
    Rejected(String),

    /// No menu item or cart line with this id.
    #[error("No menu item with id {0}")]
    UnknownItem(String),
}

/// Read the account password from the environment.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` if `PIZZA_PASSWORD` is unset.
pub fn password_from_env() -> Result<SecretString, CliError> {
    std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar(PASSWORD_ENV))
}
