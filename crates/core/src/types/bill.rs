//! Draft bills assembled at the counter before they become purchases.

use chrono::{DateTime, NaiveDate, Utc};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;
use super::purchase::{LineItem, Purchase};

/// Errors that can occur while assembling a [`Bill`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BillError {
    /// A line was added with quantity zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The product is past its expiry date.
    #[error("product {0} has expired")]
    Expired(ProductId),
    /// The bill would take more units than are in stock.
    #[error("product {product_id}: requested {requested}, only {available} in stock")]
    InsufficientStock {
        /// Product being billed.
        product_id: ProductId,
        /// Total units the bill would contain.
        requested: u32,
        /// Units in stock.
        available: u32,
    },
    /// The bill has no lines.
    #[error("bill has no items")]
    Empty,
}

/// A bill under construction.
///
/// Adding the same product twice merges into one line. Stock and expiry are
/// checked against the product snapshot passed to [`Bill::add`].
///
/// ## Examples
///
/// ```
/// use chrono::{NaiveDate, Utc};
/// use tally_core::{Bill, Price, Product};
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// let rice = Product::new(1, "Rice", Price::from_units(50), 100);
///
/// let mut bill = Bill::new();
/// bill.add(&rice, 2, today).unwrap();
/// bill.add(&rice, 1, today).unwrap();
/// assert_eq!(bill.lines().len(), 1);
/// assert_eq!(bill.total(), Price::from_units(150));
///
/// let purchase = bill.into_purchase(Utc::now()).unwrap();
/// assert!(purchase.id.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bill {
    lines: Vec<LineItem>,
}

impl Bill {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of `product` at its current price.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `quantity` is zero
    /// - the product has expired on `today`
    /// - the merged line would exceed the product's stock
    pub fn add(&mut self, product: &Product, quantity: u32, today: NaiveDate) -> Result<(), BillError> {
        if quantity == 0 {
            return Err(BillError::ZeroQuantity);
        }
        if product.is_expired(today) {
            return Err(BillError::Expired(product.id.clone()));
        }

        let existing = self
            .lines
            .iter()
            .position(|line| line.product_id == product.id);
        let already = existing
            .and_then(|i| self.lines.get(i))
            .map_or(0, |line| line.quantity);
        let requested = already.saturating_add(quantity);
        if requested > product.quantity {
            return Err(BillError::InsufficientStock {
                product_id: product.id.clone(),
                requested,
                available: product.quantity,
            });
        }

        match existing.and_then(|i| self.lines.get_mut(i)) {
            Some(line) => {
                line.quantity = requested;
                line.unit_price = product.price;
            }
            None => self
                .lines
                .push(LineItem::new(product.id.clone(), quantity, product.price)),
        }
        Ok(())
    }

    /// Drop the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(LineItem::total).sum()
    }

    /// Turn the bill into an unconfirmed purchase.
    ///
    /// # Errors
    ///
    /// Returns `BillError::Empty` if the bill has no lines.
    pub fn into_purchase(self, timestamp: DateTime<Utc>) -> Result<Purchase, BillError> {
        if self.lines.is_empty() {
            return Err(BillError::Empty);
        }
        Ok(Purchase::new(self.lines, timestamp))
    }
}
