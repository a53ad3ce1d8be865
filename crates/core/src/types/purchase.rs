//! Purchase (sale) records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, PurchaseId};
use super::price::Price;

/// One line of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the time of sale.
    pub unit_price: Price,
}

impl LineItem {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Price) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A purchase in the ledger.
///
/// A purchase without an identifier is a local draft; the remote service
/// assigns the identifier when it records the purchase. Once it carries one
/// the record is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PurchaseId>,
    pub items: Vec<LineItem>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
}

impl Purchase {
    /// Create an unconfirmed purchase whose total is the sum of its lines.
    #[must_use]
    pub fn new(items: Vec<LineItem>, timestamp: DateTime<Utc>) -> Self {
        let total = items.iter().map(LineItem::total).sum();
        Self {
            id: None,
            items,
            total,
            timestamp,
        }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<PurchaseId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether the purchase carries a non-empty identifier.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.id.as_ref().is_some_and(|id| !id.is_empty())
    }

    /// Units of `product_id` across all lines.
    #[must_use]
    pub fn units_of(&self, product_id: &ProductId) -> u64 {
        self.items
            .iter()
            .filter(|line| &line.product_id == product_id)
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Whether the purchase happened on `date` (UTC).
    #[must_use]
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.timestamp.date_naive() == date
    }
}
