//! Cart manager.
//!
//! Lines live at `cartItems/{uid}/items/{menuItemId}`. Every mutation is a
//! plain read followed by a write; two sessions changing the same line at
//! once can lose an update.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use pizza_cafe_core::{MenuItemId, Price, Quantity, UserId};

use crate::error::{AppError, Result};
use crate::models::{CartLine, MenuItem};
use crate::store::{DocumentStore, Fields, Query, collections};

/// Outcome of [`CartManager::change_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line did not exist; nothing was written.
    Missing,
    /// The quantity dropped to zero or below and the line was deleted.
    Removed,
    /// The line now holds this quantity.
    Updated(Quantity),
}

/// Body of a newly created cart line document.
#[derive(Serialize)]
struct NewLine<'a> {
    name: &'a str,
    price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    quantity: Quantity,
}

/// Per-user cart operations.
pub struct CartManager<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> CartManager<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// All lines in the user's cart, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn load_cart(&self, uid: &UserId) -> Result<Vec<CartLine>> {
        let collection = collections::cart_items(uid);
        let docs = self
            .store
            .query(&collection, &Query::all())
            .await
            .map_err(AppError::Fetch)?;
        Ok(super::decode_all(&collection, &docs))
    }

    /// Add one unit of `item`.
    ///
    /// An existing line gets its quantity bumped; otherwise a new line is
    /// created with the item's current name, price and image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the line cannot be read and
    /// `AppError::Write` if the write fails.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_or_increment(&self, uid: &UserId, item: &MenuItem) -> Result<Quantity> {
        let path = collections::cart_items(uid).doc(&item.id);
        let existing = self.store.get(&path).await.map_err(AppError::Fetch)?;

        match existing {
            Some(doc) => {
                let quantity = stored_quantity(doc.field("quantity")).offset(1);
                self.store
                    .update(&path, Fields::new().with("quantity", quantity.get()))
                    .await
                    .map_err(AppError::Write)?;
                debug!(quantity = quantity.get(), "Cart line incremented");
                Ok(quantity)
            }
            None => {
                let line = NewLine {
                    name: &item.name,
                    price: item.price,
                    image: item.image_url.as_deref(),
                    quantity: Quantity::ONE,
                };
                let fields = Fields::from_serializable(&line).map_err(AppError::Write)?;
                self.store
                    .set(&path, fields)
                    .await
                    .map_err(AppError::Write)?;
                debug!("Cart line created");
                Ok(Quantity::ONE)
            }
        }
    }

    /// Apply `delta` to a line's quantity, deleting it at zero or below.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the line cannot be read and
    /// `AppError::Write` if the write fails.
    #[instrument(skip(self))]
    pub async fn change_quantity(
        &self,
        uid: &UserId,
        line_id: &MenuItemId,
        delta: i64,
    ) -> Result<QuantityChange> {
        let path = collections::cart_items(uid).doc(line_id);
        let Some(doc) = self.store.get(&path).await.map_err(AppError::Fetch)? else {
            return Ok(QuantityChange::Missing);
        };

        let quantity = stored_quantity(doc.field("quantity")).offset(delta);
        if quantity.is_positive() {
            self.store
                .update(&path, Fields::new().with("quantity", quantity.get()))
                .await
                .map_err(AppError::Write)?;
            Ok(QuantityChange::Updated(quantity))
        } else {
            self.store.delete(&path).await.map_err(AppError::Write)?;
            Ok(QuantityChange::Removed)
        }
    }

    /// Delete a line. Removing a missing line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Write` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, uid: &UserId, line_id: &MenuItemId) -> Result<()> {
        self.store
            .delete(&collections::cart_items(uid).doc(line_id))
            .await
            .map_err(AppError::Write)
    }
}

fn stored_quantity(value: Option<&Value>) -> Quantity {
    value.map_or_else(Quantity::default, Quantity::from_value)
}
