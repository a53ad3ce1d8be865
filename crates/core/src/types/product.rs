//! Product catalog records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::status::StockStatus;

/// A product in the catalog.
///
/// ## Wire form
///
/// ```json
/// {"id": 1, "name": "Rice", "price": 50, "quantity": 100,
///  "category": "Grains", "expiry": "2026-12-31"}
/// ```
///
/// `quantity` is also accepted as `qty` or `stock` on input. Absent optional
/// fields are omitted on output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique within a store instance.
    pub id: ProductId,
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    #[serde(alias = "qty", alias = "stock")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Last day the product may be sold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
}

impl Product {
    /// Create a product without category or expiry.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Price, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
            category: None,
            expiry: None,
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the expiry date.
    #[must_use]
    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Whether the product has reached its expiry date on `today`.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= today)
    }

    /// Classify the product on `today` against a low-stock threshold.
    #[must_use]
    pub fn stock_status(&self, today: NaiveDate, low_threshold: u32) -> StockStatus {
        if self.is_expired(today) {
            StockStatus::Expired
        } else if self.quantity == 0 {
            StockStatus::OutOfStock
        } else if self.quantity <= low_threshold {
            StockStatus::Low
        } else {
            StockStatus::Available
        }
    }

    /// Value of the stock on hand.
    #[must_use]
    pub fn stock_value(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Case-insensitive substring match over name and category.
    ///
    /// An empty (or all-whitespace) query matches every product.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_deserialize_minimal_product() {
        let product: Product =
            serde_json::from_str(r#"{"id":1,"name":"Rice","price":50,"qty":100}"#).unwrap();
        assert_eq!(product, Product::new(1, "Rice", Price::from_units(50), 100));
    }

    #[test]
    fn test_deserialize_full_product() {
        let json = r#"{
            "id": "a1",
            "name": "Milk",
            "price": 1.25,
            "quantity": 12,
            "category": "Dairy",
            "expiry": "2026-10-20"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::from("a1"));
        assert_eq!(product.price.amount(), dec!(1.25));
        assert_eq!(product.category.as_deref(), Some("Dairy"));
        assert_eq!(product.expiry, Some(day(2026, 10, 20)));
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let json = serde_json::to_value(Product::new(1, "Rice", Price::from_units(50), 100)).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("category"));
        assert!(!object.contains_key("expiry"));
        assert_eq!(object["quantity"], 100);
    }

    #[test]
    fn test_stock_status() {
        let today = day(2026, 10, 18);
        let product = Product::new(1, "Rice", Price::from_units(50), 100);
        assert_eq!(product.stock_status(today, 10), StockStatus::Available);

        let low = Product { quantity: 10, ..product.clone() };
        assert_eq!(low.stock_status(today, 10), StockStatus::Low);

        let empty = Product { quantity: 0, ..product.clone() };
        assert_eq!(empty.stock_status(today, 10), StockStatus::OutOfStock);

        let expired = product.with_expiry(today);
        assert_eq!(expired.stock_status(today, 10), StockStatus::Expired);
        assert!(!expired.is_expired(day(2026, 10, 17)));
    }

    #[test]
    fn test_matches_name_and_category() {
        let product = Product::new(1, "Basmati Rice", Price::from_units(50), 1).with_category("Grains");
        assert!(product.matches("rice"));
        assert!(product.matches("GRAIN"));
        assert!(product.matches("  "));
        assert!(!product.matches("sugar"));
    }

    #[test]
    fn test_stock_value() {
        let product = Product::new(1, "Oil", Price::new(dec!(2.5)), 4);
        assert_eq!(product.stock_value(), Price::from_units(10));
    }
}
