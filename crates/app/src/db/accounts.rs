//! Account repository for the self-hosted auth provider.
//!
//! Queries are checked at runtime so the crate builds without a live database.

use sqlx::PgPool;

use pizza_cafe_core::{Email, UserId};

use super::RepositoryError;
use crate::auth::User;

/// Account row together with its password hash.
pub struct AccountRecord {
    /// Public identity.
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<AccountRecord>, RepositoryError> {
        let row: Option<(String, String, Option<String>, String)> = sqlx::query_as(
            r"
            SELECT uid, email, display_name, password_hash
            FROM accounts
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some((uid, email, display_name, password_hash)) = row else {
            return Ok(None);
        };

        let email = Email::parse(&email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some(AccountRecord {
            user: User {
                uid: UserId::new(uid),
                email,
                display_name,
            },
            password_hash,
        }))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        let uid = UserId::generate();

        sqlx::query(
            r"
            INSERT INTO accounts (uid, email, password_hash)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(uid.as_str())
        .bind(email.as_str())
        .bind(password_hash)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(User {
            uid,
            email: email.clone(),
            display_name: None,
        })
    }
}
