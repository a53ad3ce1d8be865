//! Core types for Tally.
//!
//! This module provides type-safe wrappers and records for the inventory and
//! billing domain.

pub mod bill;
pub mod id;
pub mod price;
pub mod product;
pub mod purchase;
pub mod status;

pub use bill::{Bill, BillError};
pub use id::*;
pub use price::Price;
pub use product::Product;
pub use purchase::{LineItem, Purchase};
pub use status::StockStatus;
