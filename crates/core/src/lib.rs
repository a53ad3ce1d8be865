//! Tally Core - Shared domain types.
//!
//! This crate provides the types used across all Tally components:
//! - `sync` - Client-side state stores (product catalog, purchase ledger)
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Record ids, prices, products, purchases, bills and stock status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
