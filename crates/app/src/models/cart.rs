//! Cart lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pizza_cafe_core::price::format_fixed;
use pizza_cafe_core::{MenuItemId, Price, Quantity};

use super::MenuItem;

/// Placeholder shown for lines stored without a name.
pub const UNNAMED_ITEM: &str = "Unnamed Item";

/// One `(item, quantity)` entry of a user's cart.
///
/// Keyed by the menu item id. Name, price and image are copied from the menu
/// when the line is created and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: MenuItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub quantity: Quantity,
}

impl CartLine {
    /// A fresh line holding one unit of `item`.
    #[must_use]
    pub fn snapshot(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            quantity: Quantity::ONE,
        }
    }

    /// `price × quantity`, unrounded. Saturates at the `Decimal` bounds.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price
            .amount()
            .saturating_mul(Decimal::from(self.quantity.get()))
    }

    /// Name for display.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNNAMED_ITEM
        } else {
            &self.name
        }
    }
}

/// Sum of `price × quantity` over `lines`, formatted with two decimals.
///
/// Unreadable stored prices and quantities count as zero. An empty cart
/// totals `"0.00"`. Out-of-range amounts saturate instead of overflowing.
#[must_use]
pub fn compute_total(lines: &[CartLine]) -> String {
    let total = lines
        .iter()
        .map(CartLine::subtotal)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    format_fixed(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: &str, cents: i64, qty: i64) -> CartLine {
        CartLine {
            id: MenuItemId::new(id),
            name: id.to_string(),
            price: Price::from_cents(cents),
            image_url: None,
            quantity: Quantity::new(qty),
        }
    }

    #[test]
    fn test_total_of_empty_cart() {
        assert_eq!(compute_total(&[]), "0.00");
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let lines = [line("margherita", 999, 2), line("cola", 500, 1)];
        assert_eq!(compute_total(&lines), "24.98");
    }

    #[test]
    fn test_total_has_no_binary_float_drift() {
        // 0.1 + 0.2 style sums must not render as 0.30000000000000004.
        let lines = [line("a", 10, 1), line("b", 20, 1)];
        assert_eq!(compute_total(&lines), "0.30");
        let lines = [line("a", 333, 3)];
        assert_eq!(compute_total(&lines), "9.99");
    }

    #[test]
    fn test_total_coerces_garbage_to_zero() {
        let lines: Vec<CartLine> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "price": "abc", "quantity": 3},
            {"id": "b", "name": "B", "price": "4.50", "quantity": "2"},
            {"id": "c", "name": "C", "price": 1.25, "quantity": null}
        ]))
        .unwrap();
        assert_eq!(compute_total(&lines), "9.00");
    }

    #[test]
    fn test_total_saturates_oversized_amounts() {
        let lines: Vec<CartLine> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "price": "79228162514264337593543950335", "quantity": 2},
            {"id": "b", "name": "B", "price": "79228162514264337593543950335", "quantity": 1}
        ]))
        .unwrap();
        assert_eq!(lines.first().unwrap().subtotal(), Decimal::MAX);
        assert!(compute_total(&lines).starts_with("79228162514264337593543950335"));

        let lines: Vec<CartLine> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "price": "-79228162514264337593543950335", "quantity": 3}
        ]))
        .unwrap();
        assert_eq!(lines.first().unwrap().subtotal(), Decimal::MIN);
    }

    #[test]
    fn test_fractional_quantity_counts_whole_units() {
        let lines: Vec<CartLine> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "price": "4.00", "quantity": 2.5}
        ]))
        .unwrap();
        assert_eq!(lines.first().unwrap().quantity, Quantity::new(2));
        assert_eq!(compute_total(&lines), "8.00");
    }

    #[test]
    fn test_snapshot_copies_menu_fields() {
        let item = MenuItem {
            id: MenuItemId::new("diavola"),
            name: "Diavola".to_string(),
            price: Price::from_cents(1150),
            image_url: Some("diavola.jpg".to_string()),
            description: Some("Spicy salami".to_string()),
        };
        let line = CartLine::snapshot(&item);
        assert_eq!(line.id, item.id);
        assert_eq!(line.price, item.price);
        assert_eq!(line.quantity, Quantity::ONE);
        assert_eq!(line.image_url.as_deref(), Some("diavola.jpg"));
    }

    #[test]
    fn test_stored_shape() {
        let json = serde_json::to_value(line("cola", 250, 3)).unwrap();
        assert_eq!(
            json,
            json!({"id": "cola", "name": "cola", "price": 2.5, "quantity": 3})
        );
    }

    #[test]
    fn test_display_name_placeholder() {
        let mut l = line("x", 100, 1);
        l.name = String::new();
        assert_eq!(l.display_name(), "Unnamed Item");
    }
}
