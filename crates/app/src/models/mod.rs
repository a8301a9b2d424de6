//! Domain models and their stored document shapes.
//!
//! Field names follow the documents as they already exist in the store:
//! menu items use capitalised keys (`Name`, `Price`, ...), everything else
//! camelCase.

pub mod cart;
pub mod menu;
pub mod order;
pub mod payment;

pub use cart::CartLine;
pub use menu::MenuItem;
pub use order::Order;
pub use payment::PaymentRecord;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read an optional server timestamp, treating anything unreadable as absent.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(crate::store::parse_timestamp))
}
