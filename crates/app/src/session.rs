//! Session holder.
//!
//! Tracks the signed-in user for the lifetime of the process and notifies
//! subscribers on every change. Views receive the holder through
//! [`AppContext`](crate::state::AppContext) rather than reading global state.
//!
//! The state starts as [`SessionState::Resolving`]: until [`SessionHolder::resolve`]
//! has asked the provider for a persisted user, identity is unknown and
//! dependents must not treat it as signed out.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use pizza_cafe_core::Email;

use crate::auth::{AuthError, AuthProvider, User};
use crate::error::{self, AppError, Result};
use crate::token_cache::{TokenCache, USER_TOKEN_KEY};

/// Identity as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Start-up restore has not finished; identity unknown.
    Resolving,
    /// No user.
    SignedOut,
    /// A user is signed in.
    SignedIn(User),
}

impl SessionState {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::Resolving | Self::SignedOut => None,
        }
    }

    /// Whether start-up restore has finished.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Resolving)
    }
}

/// Authoritative holder of the current session.
///
/// Cheaply cloneable; clones share state and subscribers.
#[derive(Clone)]
pub struct SessionHolder {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    auth: Arc<dyn AuthProvider>,
    tokens: Arc<dyn TokenCache>,
    state: watch::Sender<SessionState>,
}

impl SessionHolder {
    /// Create a holder in the `Resolving` state.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, tokens: Arc<dyn TokenCache>) -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        Self {
            inner: Arc::new(SessionInner {
                auth,
                tokens,
                state,
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to session changes.
    ///
    /// The receiver sees the current value immediately and is notified on
    /// every login, logout and start-up resolution.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotSignedIn` when no user is signed in.
    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(AppError::NotSignedIn)
    }

    /// Restore a persisted session from the provider.
    ///
    /// On provider failure the session settles as signed out and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the provider cannot be reached.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<SessionState> {
        match self.inner.auth.current_user().await {
            Ok(Some(user)) => {
                info!(uid = %user.uid, "Session restored");
                self.mirror_token(&user).await;
                error::set_sentry_user(&user.uid, Some(user.email.as_str()));
                self.publish(SessionState::SignedIn(user));
            }
            Ok(None) => {
                info!("No session to restore");
                self.publish(SessionState::SignedOut);
            }
            Err(e) => {
                self.publish(SessionState::SignedOut);
                return Err(e.into());
            }
        }
        Ok(self.state())
    }

    /// Sign in with email and password.
    ///
    /// Blank credentials are rejected without contacting the provider.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` for missing or wrong credentials or provider failure.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<User> {
        let email = check_credentials(email, password)?;
        let user = self.inner.auth.sign_in(&email, password).await?;
        self.on_signed_in(&user).await;
        Ok(user)
    }

    /// Create an account; the new user is signed in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` for missing credentials, an existing account,
    /// a weak password or provider failure.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<User> {
        let email = check_credentials(email, password)?;
        let user = self.inner.auth.sign_up(&email, password).await?;
        info!(uid = %user.uid, "Account created");
        self.on_signed_in(&user).await;
        Ok(user)
    }

    /// Sign out and drop the local token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the provider fails; the session is unchanged.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.inner.auth.sign_out().await?;
        if let Err(e) = self.inner.tokens.remove(USER_TOKEN_KEY).await {
            warn!(error = %e, "Failed to clear cached session token");
        }
        error::clear_sentry_user();
        self.publish(SessionState::SignedOut);
        info!("Signed out");
        Ok(())
    }

    async fn on_signed_in(&self, user: &User) {
        info!(uid = %user.uid, "Signed in");
        self.mirror_token(user).await;
        error::set_sentry_user(&user.uid, Some(user.email.as_str()));
        error::add_breadcrumb("auth", "Signed in", None);
        self.publish(SessionState::SignedIn(user.clone()));
    }

    /// Record session presence locally; the cache is a mirror, so failures
    /// are logged only.
    async fn mirror_token(&self, user: &User) {
        if let Err(e) = self
            .inner
            .tokens
            .set(USER_TOKEN_KEY, user.uid.as_str())
            .await
        {
            warn!(error = %e, "Failed to cache session token");
        }
    }

    fn publish(&self, state: SessionState) {
        self.inner.state.send_replace(state);
    }
}

fn check_credentials(email: &str, password: &SecretString) -> Result<Email> {
    if email.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(AuthError::MissingCredentials.into());
    }
    Ok(Email::parse(email).map_err(AuthError::from)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuthProvider;
    use crate::token_cache::MemoryTokenCache;

    fn holder() -> (SessionHolder, MemoryAuthProvider, MemoryTokenCache) {
        let auth = MemoryAuthProvider::new();
        let tokens = MemoryTokenCache::new();
        let session = SessionHolder::new(Arc::new(auth.clone()), Arc::new(tokens.clone()));
        (session, auth, tokens)
    }

    fn password() -> SecretString {
        SecretString::from("funghi-123")
    }

    #[tokio::test]
    async fn test_starts_resolving_then_signed_out() {
        let (session, _, _) = holder();
        assert_eq!(session.state(), SessionState::Resolving);
        assert!(session.current_user().is_none());

        let state = session.resolve().await.unwrap();
        assert_eq!(state, SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_and_mirrors_token() {
        let (session, _, tokens) = holder();
        session.resolve().await.unwrap();
        let user = session.sign_up("mario@example.com", &password()).await.unwrap();

        assert_eq!(session.current_user(), Some(user.clone()));
        assert_eq!(
            tokens.get(USER_TOKEN_KEY).await.unwrap().as_deref(),
            Some(user.uid.as_str())
        );
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let (session, _, tokens) = holder();
        session.sign_up("mario@example.com", &password()).await.unwrap();
        session.sign_out().await.unwrap();

        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(tokens.get(USER_TOKEN_KEY).await.unwrap().is_none());
        assert!(matches!(session.require_user(), Err(AppError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_blank_credentials_never_reach_provider() {
        let (session, auth, _) = holder();
        let err = session.sign_in("  ", &password()).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::MissingCredentials)));
        let err = session
            .sign_in("mario@example.com", &SecretString::from(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::MissingCredentials)));
        assert_eq!(auth.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_every_change() {
        let (session, _, _) = holder();
        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow_and_update(), SessionState::Resolving);

        session.resolve().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::SignedOut);

        session.sign_up("mario@example.com", &password()).await.unwrap();
        rx.changed().await.unwrap();
        assert!(matches!(*rx.borrow_and_update(), SessionState::SignedIn(_)));

        session.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_restores_persisted_user() {
        let (first, auth, _) = holder();
        let user = first.sign_up("mario@example.com", &password()).await.unwrap();

        // A new holder over the same provider, as after an app restart.
        let restarted = SessionHolder::new(Arc::new(auth), Arc::new(MemoryTokenCache::new()));
        let state = restarted.resolve().await.unwrap();
        assert_eq!(state, SessionState::SignedIn(user));
    }

    #[tokio::test]
    async fn test_provider_failure_during_resolve_settles_signed_out() {
        let (session, auth, _) = holder();
        auth.set_unavailable(true).await;
        assert!(session.resolve().await.is_err());
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session() {
        let (session, auth, _) = holder();
        session.sign_up("mario@example.com", &password()).await.unwrap();
        auth.set_unavailable(true).await;
        assert!(session.sign_out().await.is_err());
        assert!(session.current_user().is_some());
    }
}
