//! In-process authentication provider.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;

use pizza_cafe_core::{Email, UserId};

use super::{AuthError, AuthProvider, HashCost, User, hash_password, validate_password, verify_password};

/// [`AuthProvider`] keeping accounts in memory.
///
/// The current user survives across [`SessionHolder`](crate::session::SessionHolder)
/// instances built on clones of the same provider, which is how a restart
/// with a persisted session is simulated.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthProvider {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Email, (User, String)>,
    current: Option<User>,
    unavailable: bool,
    calls: usize,
}

impl Inner {
    fn begin(&mut self) -> Result<(), AuthError> {
        self.calls += 1;
        if self.unavailable {
            return Err(AuthError::Unavailable("network request failed".to_owned()));
        }
        Ok(())
    }
}

impl MemoryAuthProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the provider being unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }

    /// Set the display name of an existing account.
    pub async fn set_display_name(&self, email: &Email, name: &str) {
        let mut inner = self.inner.lock().await;
        if let Some((user, _)) = inner.accounts.get_mut(email) {
            user.display_name = Some(name.to_owned());
            let updated = user.clone();
            if inner.current.as_ref().is_some_and(|c| c.uid == updated.uid) {
                inner.current = Some(updated);
            }
        }
    }

    /// Number of provider calls made so far, successful or not.
    pub async fn call_count(&self) -> usize {
        self.inner.lock().await.calls
    }
}

#[async_trait::async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<User, AuthError> {
        let mut inner = self.inner.lock().await;
        inner.begin()?;
        let (user, hash) = inner
            .accounts
            .get(email)
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;
        let user = user.clone();
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, email: &Email, password: &SecretString) -> Result<User, AuthError> {
        let mut inner = self.inner.lock().await;
        inner.begin()?;
        validate_password(password)?;
        if inner.accounts.contains_key(email) {
            return Err(AuthError::UserAlreadyExists);
        }
        let hash = hash_password(password, HashCost::Minimal)?;
        let user = User {
            uid: UserId::generate(),
            email: email.clone(),
            display_name: None,
        };
        inner.accounts.insert(email.clone(), (user.clone(), hash));
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut inner = self.inner.lock().await;
        inner.begin()?;
        inner.current = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let mut inner = self.inner.lock().await;
        inner.begin()?;
        Ok(inner.current.clone())
    }
}
