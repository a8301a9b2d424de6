//! Authentication provider collaborator.
//!
//! The application never verifies credentials itself: it asks an
//! [`AuthProvider`] and keeps the resulting [`User`] in the
//! [`SessionHolder`](crate::session::SessionHolder).
//!
//! # Providers
//!
//! - [`MemoryAuthProvider`] - in-process accounts, used by tests and demos
//! - [`PgAuthProvider`] - accounts in `PostgreSQL` (`postgres` feature)
//!
//! Both hash passwords with Argon2id.

mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use error::AuthError;
pub use memory::MemoryAuthProvider;
#[cfg(feature = "postgres")]
pub use postgres::PgAuthProvider;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use pizza_cafe_core::{Email, UserId};

/// Minimum password length accepted by the providers.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Greeting used when an account has no display name.
pub const DEFAULT_DISPLAY_NAME: &str = "Pizza Lover";

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned identifier; keys all per-user collections.
    pub uid: UserId,
    /// Sign-in email.
    pub email: Email,
    /// Optional profile name.
    pub display_name: Option<String>,
}

impl User {
    /// Display name, or the default greeting when unset or blank.
    #[must_use]
    pub fn display_name_or_default(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

/// Operations the application needs from an authentication provider.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials and make the account the provider's current user.
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<User, AuthError>;

    /// Create an account; the new account becomes the current user.
    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<User, AuthError>;

    /// Forget the current user.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The user persisted by the provider, if any. Used to restore a session
    /// at start-up.
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// Cost profile for password hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashCost {
    /// Argon2id library defaults.
    #[default]
    Standard,
    /// Minimum parameters; only for throwaway in-memory accounts.
    Minimal,
}

/// Validate a password before hashing.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &SecretString, cost: HashCost) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = match cost {
        HashCost::Standard => Argon2::default(),
        HashCost::Minimal => {
            let params = Params::new(
                Params::MIN_M_COST,
                Params::MIN_T_COST,
                Params::MIN_P_COST,
                None,
            )
            .map_err(|_| AuthError::PasswordHash)?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        }
    };

    argon2
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match.
pub fn verify_password(password: &SecretString, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
