//! Orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pizza_cafe_core::OrderId;

use super::CartLine;

/// Shown when an order has no readable timestamp.
pub const DATE_NOT_AVAILABLE: &str = "Date not available";

/// An immutable record of a submitted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Cart lines exactly as they were at submission.
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Two-decimal total computed at submission.
    #[serde(default)]
    pub total: String,
    /// Server-assigned creation time.
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "super::lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creation time for display.
    #[must_use]
    pub fn created_at_label(&self) -> String {
        self.created_at.map_or_else(
            || DATE_NOT_AVAILABLE.to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    }

    /// Total for display, e.g. `"$24.98"`.
    #[must_use]
    pub fn total_label(&self) -> String {
        format!("${}", self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decodes_stored_order() {
        let order: Order = serde_json::from_value(json!({
            "id": "o1",
            "items": [{"id": "margherita", "name": "Margherita", "price": 9.99, "quantity": 2}],
            "total": "19.98",
            "createdAt": "2026-06-01T18:30:00.000000000Z"
        }))
        .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_label(), "$19.98");
        assert_eq!(order.created_at_label(), "2026-06-01 18:30:00 UTC");
    }

    #[test]
    fn test_missing_timestamp_label() {
        let order: Order = serde_json::from_value(json!({"id": "o2", "total": "1.00"})).unwrap();
        assert_eq!(order.created_at_label(), "Date not available");

        let order: Order =
            serde_json::from_value(json!({"id": "o3", "createdAt": "yesterday"})).unwrap();
        assert_eq!(order.created_at_label(), "Date not available");
        assert!(order.items.is_empty());
    }
}
