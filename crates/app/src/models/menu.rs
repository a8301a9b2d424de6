//! Menu items.

use serde::{Deserialize, Serialize};

use pizza_cafe_core::{MenuItemId, Price};

/// A purchasable menu entry.
///
/// Maintained out-of-band; the ordering flows only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(skip_serializing)]
    pub id: MenuItemId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Price", default)]
    pub price: Price,
    #[serde(rename = "Image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MenuItem {
    /// Price label, or `"Price N/A"` when the stored price is zero or unreadable.
    #[must_use]
    pub fn price_label(&self) -> String {
        if self.price == Price::ZERO {
            "Price N/A".to_string()
        } else {
            format!("Price: {}", self.price)
        }
    }
}
