//! Remote service client.
//!
//! # Contract
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | [`RemoteClient::list_products`] | `GET /products` | JSON array of products |
//! | [`RemoteClient::list_purchases`] | `GET /purchases` | JSON array of purchases |
//! | [`RemoteClient::create_purchase`] | `POST /purchases` (purchase without `id`) | the purchase echoed back with a server-assigned `id` |
//!
//! Stores depend on the [`RemoteClient`] trait, not on HTTP, so tests and
//! embedders can inject any implementation. [`HttpClient`] is the `reqwest`
//! implementation used in production.

mod http;

pub use http::{DEFAULT_BASE_URL, HttpClient};

use async_trait::async_trait;
use tally_core::{Product, Purchase};

use crate::error::RemoteError;

/// The remote service as seen by the stores.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// `GET /products`.
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError>;

    /// `GET /purchases`.
    async fn list_purchases(&self) -> Result<Vec<Purchase>, RemoteError>;

    /// `POST /purchases`. Returns the recorded purchase.
    async fn create_purchase(&self, purchase: &Purchase) -> Result<Purchase, RemoteError>;
}
