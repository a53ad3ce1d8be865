//! Built-in catalog used when the local cache is empty or unreadable.

use rust_decimal::Decimal;
use tally_core::{Price, Product};

/// The seed catalog.
///
/// A local-only product store starts from this collection when its cache has
/// no usable snapshot, and writes it back so the next start finds it.
#[must_use]
pub fn seed_products() -> Vec<Product> {
    vec![
        Product::new(1, "Rice", Price::from_units(50), 100).with_category("Grains"),
        Product::new(2, "Sugar", Price::from_units(42), 80).with_category("Groceries"),
        Product::new(3, "Sunflower Oil", Price::new(Decimal::new(13_550, 2)), 40)
            .with_category("Groceries"),
    ]
}
