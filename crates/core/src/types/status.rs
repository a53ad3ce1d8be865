//! Status enums for inventory records.

use serde::{Deserialize, Serialize};

/// Stock status of a product on a given day.
///
/// Expiry and zeroing are status changes, never removals: a product keeps its
/// place in the catalog whatever its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// In stock above the low-stock threshold.
    #[default]
    Available,
    /// In stock, at or below the low-stock threshold.
    Low,
    /// Quantity is zero.
    OutOfStock,
    /// Expiry date reached. Takes precedence over every quantity-based status.
    Expired,
}

impl StockStatus {
    /// Whether the product can be sold in this status.
    #[must_use]
    pub const fn is_sellable(self) -> bool {
        matches!(self, Self::Available | Self::Low)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Low => write!(f, "low"),
            Self::OutOfStock => write!(f, "out_of_stock"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
