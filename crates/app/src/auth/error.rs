//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("The email address is badly formatted ({0}).")]
    InvalidEmail(#[from] pizza_cafe_core::EmailError),

    /// Wrong password or unknown email.
    #[error("The email or password is incorrect.")]
    InvalidCredentials,

    /// Email already registered.
    #[error("The email address is already in use by another account.")]
    UserAlreadyExists,

    /// Password too weak.
    #[error("Password should be at least {min} characters.")]
    WeakPassword {
        /// Minimum accepted length.
        min: usize,
    },

    /// Email or password left blank; rejected before reaching the provider.
    #[error("email and password are required")]
    MissingCredentials,

    /// Provider could not be reached.
    #[error("authentication provider unavailable: {0}")]
    Unavailable(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Repository(#[from] crate::db::RepositoryError),
}

impl AuthError {
    /// Whether the failure is on the provider side rather than the user's input.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::PasswordHash => true,
            #[cfg(feature = "postgres")]
            Self::Repository(_) => true,
            _ => false,
        }
    }
}
