//! Menu catalog.

use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::models::MenuItem;
use crate::store::{DocumentStore, Fields, Query, collections};

/// Read access to `menuItems`, plus the upsert used by seeding.
pub struct MenuCatalog<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> MenuCatalog<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every menu item, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn load_menu(&self) -> Result<Vec<MenuItem>> {
        let collection = collections::menu_items();
        let docs = self
            .store
            .query(&collection, &Query::all())
            .await
            .map_err(AppError::Fetch)?;
        Ok(super::decode_all(&collection, &docs))
    }

    /// Create or replace a menu item under its id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Write` if the store rejects the write.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn upsert_item(&self, item: &MenuItem) -> Result<()> {
        let fields = Fields::from_serializable(item).map_err(AppError::Write)?;
        self.store
            .set(&collections::menu_items().doc(&item.id), fields)
            .await
            .map_err(AppError::Write)?;
        info!(item_id = %item.id, "Menu item stored");
        Ok(())
    }
}
