//! Application context shared by every view.

use std::sync::Arc;

use crate::auth::{AuthProvider, MemoryAuthProvider};
use crate::config::AppConfig;
use crate::session::SessionHolder;
use crate::store::{DocumentStore, MemoryStore};
use crate::token_cache::{MemoryTokenCache, TokenCache};

/// Collaborators and session shared across views.
///
/// This struct is cheaply cloneable via `Arc`; clones share the same store,
/// auth provider and session.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    session: SessionHolder,
}

impl AppContext {
    /// Assemble a context from explicit collaborators.
    ///
    /// The session starts out `Resolving`; call
    /// [`SessionHolder::resolve`] before relying on it.
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        tokens: Arc<dyn TokenCache>,
    ) -> Self {
        Self {
            inner: Arc::new(AppContextInner {
                config,
                store,
                session: SessionHolder::new(auth, tokens),
            }),
        }
    }

    /// A context over fresh in-memory backends.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAuthProvider::new()),
            Arc::new(MemoryTokenCache::new()),
        )
    }

    /// Connect the `PostgreSQL` backends described by `config`.
    ///
    /// The token cache is the JSON file at `config.token_cache_path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no database URL is configured and
    /// `AppError::Database` if the pool cannot connect.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: AppConfig) -> crate::error::Result<Self> {
        use crate::auth::PgAuthProvider;
        use crate::store::PgDocumentStore;
        use crate::token_cache::FileTokenCache;

        let pool =
            crate::db::create_pool(config.require_database_url()?, config.db_max_connections)
                .await?;
        tracing::info!("Connected to database");

        let tokens = FileTokenCache::new(config.token_cache_path.clone());
        Ok(Self::new(
            config,
            Arc::new(PgDocumentStore::new(pool.clone())),
            Arc::new(PgAuthProvider::new(pool)),
            Arc::new(tokens),
        ))
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the session holder.
    #[must_use]
    pub fn session(&self) -> &SessionHolder {
        &self.inner.session
    }
}
