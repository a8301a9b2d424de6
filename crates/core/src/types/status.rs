//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Payment status of an order.
///
/// Only `Paid` is ever written to a payment record. `Pending` is implied when
/// no record exists for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    /// Whether the order still accepts a payment action.
    #[must_use]
    pub const fn is_payable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Paid => write!(f, "Paid"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}
