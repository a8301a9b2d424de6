//! Self-hosted authentication provider backed by `PostgreSQL`.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;
use tokio::sync::RwLock;

use pizza_cafe_core::Email;

use super::{AuthError, AuthProvider, HashCost, User, hash_password, validate_password, verify_password};
use crate::db::RepositoryError;
use crate::db::accounts::AccountRepository;

/// [`AuthProvider`] storing accounts in the `accounts` table.
///
/// The signed-in user is held for the lifetime of the process only, so
/// [`AuthProvider::current_user`] is `None` after a restart.
#[derive(Debug, Clone)]
pub struct PgAuthProvider {
    pool: PgPool,
    current: Arc<RwLock<Option<User>>>,
}

impl PgAuthProvider {
    /// Create a provider over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            current: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for PgAuthProvider {
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<User, AuthError> {
        let record = AccountRepository::new(&self.pool)
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &record.password_hash)?;

        *self.current.write().await = Some(record.user.clone());
        Ok(record.user)
    }

    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<User, AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password, HashCost::Standard)?;

        let user = AccountRepository::new(&self.pool)
            .create(email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.current.read().await.clone())
    }
}
