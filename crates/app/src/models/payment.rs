//! Payment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pizza_cafe_core::{OrderId, PaymentId, PaymentStatus};

/// A payment made against one order.
///
/// Linked by `orderId` equality; nothing stops two records for the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    /// The order's total string at payment time.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(rename = "paidAt", default, deserialize_with = "super::lenient_timestamp")]
    pub paid_at: Option<DateTime<Utc>>,
}
