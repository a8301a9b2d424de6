//! Data operations behind each screen.
//!
//! Services borrow a [`DocumentStore`](crate::store::DocumentStore) for the
//! duration of one operation and hold no state of their own. Reads surface as
//! `AppError::Fetch`, writes as `AppError::Write`.
//!
//! # Services
//!
//! - [`MenuCatalog`] - read the menu, upsert items (seeding)
//! - [`CartManager`] - per-user cart lines
//! - [`OrderSubmitter`] - turn a cart snapshot into an order, list orders
//! - [`PaymentRecorder`] - latest order status and payment records

pub mod cart;
pub mod menu;
pub mod orders;
pub mod payments;

pub use cart::{CartManager, QuantityChange};
pub use menu::MenuCatalog;
pub use orders::OrderSubmitter;
pub use payments::{LatestOrder, PaymentRecorder};

pub use crate::models::cart::compute_total;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::store::{CollectionPath, Document};

/// Decode every document, skipping (and logging) the ones that do not fit `T`.
fn decode_all<T: DeserializeOwned>(collection: &CollectionPath, docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode_with_id(collection) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable document");
                None
            }
        })
        .collect()
}
