//! Integration tests for Pizza Café.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pizza-cafe-integration-tests
//! ```
//!
//! The tests drive the views and services end to end over the in-memory
//! backends, so no database is needed.
//!
//! # Test Categories
//!
//! - `ordering_flow` - menu → cart → order → payment
//! - `session_flow` - sign-in, sign-up, sign-out and the token cache
//! - `view_lifecycle` - activation, stale responses and duplicate taps

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;
use tokio::sync::Semaphore;

use pizza_cafe_app::AppContext;
use pizza_cafe_app::auth::{MemoryAuthProvider, User};
use pizza_cafe_app::config::AppConfig;
use pizza_cafe_app::models::MenuItem;
use pizza_cafe_app::services::MenuCatalog;
use pizza_cafe_app::store::{
    Batch, CollectionPath, Document, DocumentPath, DocumentStore, Fields, MemoryStore, Query,
    StoreError,
};
use pizza_cafe_app::token_cache::MemoryTokenCache;
use pizza_cafe_core::{MenuItemId, Price};

/// Email used by [`TestApp::signed_in`].
pub const TEST_EMAIL: &str = "mario@example.com";

/// Password used by [`TestApp::signed_in`].
#[must_use]
pub fn test_password() -> SecretString {
    SecretString::from("margherita-42")
}

/// An application over in-memory backends, with handles to each backend.
pub struct TestApp {
    pub ctx: AppContext,
    pub store: MemoryStore,
    pub gate: GatedStore,
    pub auth: MemoryAuthProvider,
    pub tokens: MemoryTokenCache,
}

impl TestApp {
    /// A fresh application with an open gate and no accounts.
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let gate = GatedStore::new(store.clone());
        let auth = MemoryAuthProvider::new();
        let tokens = MemoryTokenCache::new();
        let ctx = AppContext::new(
            AppConfig::default(),
            Arc::new(gate.clone()),
            Arc::new(auth.clone()),
            Arc::new(tokens.clone()),
        );
        Self {
            ctx,
            store,
            gate,
            auth,
            tokens,
        }
    }

    /// A fresh application with [`TEST_EMAIL`] registered and signed in.
    ///
    /// # Panics
    ///
    /// Panics if sign-up fails, which indicates a broken test setup.
    pub async fn signed_in() -> (Self, User) {
        let app = Self::new();
        if let Err(e) = app.ctx.session().resolve().await {
            panic!("session resolve failed: {e}");
        }
        let user = match app.ctx.session().sign_up(TEST_EMAIL, &test_password()).await {
            Ok(user) => user,
            Err(e) => panic!("sign-up failed: {e}"),
        };
        (app, user)
    }

    /// Store menu items under their ids.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store rejects a write.
    pub async fn seed_menu(&self, items: &[MenuItem]) {
        let catalog = MenuCatalog::new(&self.store);
        for item in items {
            if let Err(e) = catalog.upsert_item(item).await {
                panic!("seeding {} failed: {e}", item.id);
            }
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A menu item priced in cents.
#[must_use]
pub fn menu_item(id: &str, name: &str, cents: i64) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_owned(),
        price: Price::from_cents(cents),
        image_url: Some(format!("https://images.pizza-cafe.example/{id}.jpg")),
        description: None,
    }
}

/// The standard test menu.
#[must_use]
pub fn sample_menu() -> Vec<MenuItem> {
    vec![
        menu_item("margherita", "Margherita", 999),
        menu_item("cola", "Cola", 500),
        menu_item("diavola", "Diavola", 1150),
    ]
}

/// A [`DocumentStore`] whose calls can be held until the test releases them.
///
/// While closed, every call waits for one permit from [`GatedStore::release`].
/// Clones share the gate.
#[derive(Clone)]
pub struct GatedStore {
    inner: MemoryStore,
    gate: Arc<Gate>,
}

struct Gate {
    closed: AtomicBool,
    permits: Semaphore,
}

impl GatedStore {
    /// Wrap `inner` with an open gate.
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Gate {
                closed: AtomicBool::new(false),
                permits: Semaphore::new(0),
            }),
        }
    }

    /// Hold every following call until released.
    pub fn close(&self) {
        self.gate.closed.store(true, Ordering::SeqCst);
    }

    /// Stop holding new calls. Calls already waiting still need [`Self::release`].
    pub fn open(&self) {
        self.gate.closed.store(false, Ordering::SeqCst);
    }

    /// Let `n` waiting (or future) calls through.
    pub fn release(&self, n: usize) {
        self.gate.permits.add_permits(n);
    }

    async fn pass(&self) {
        if self.gate.closed.load(Ordering::SeqCst)
            && let Ok(permit) = self.gate.permits.acquire().await
        {
            permit.forget();
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for GatedStore {
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        self.pass().await;
        self.inner.query(collection, query).await
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.pass().await;
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.pass().await;
        self.inner.set(path, fields).await
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.pass().await;
        self.inner.update(path, fields).await
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.pass().await;
        self.inner.add(collection, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.pass().await;
        self.inner.delete(path).await
    }

    async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        self.pass().await;
        self.inner.commit(batch).await
    }
}
