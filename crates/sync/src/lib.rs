//! Tally Sync - Client-side state for the inventory and billing app.
//!
//! Two reactive stores keep the app's working state:
//!
//! - [`ProductStore`] - the product catalog, loaded from the remote service
//!   or from a persistent cache seeded with a built-in catalog
//! - [`PurchaseStore`] - the purchase ledger, synchronized with the remote
//!   service or kept in session memory
//!
//! Each store exposes its collection, a loading flag and an error slot as
//! [`ReadSignal`]s. Views subscribe to them and re-render on change; no store
//! operation ever returns an error.
//!
//! # Quick start
//!
//! ```no_run
//! use tally_sync::{AppContext, SyncConfig, telemetry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_env()?;
//! telemetry::init_tracing(telemetry::DEFAULT_FILTER, config.log_format);
//! let ctx = AppContext::from_config(&config)?;
//! ctx.init().await;
//!
//! for product in ctx.products().products().get() {
//!     println!("{} x{}", product.name, product.quantity);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`stores`] - Product and purchase stores
//! - [`remote`] - Remote service contract and its HTTP client
//! - [`cache`] - Persistent key-value cache
//! - [`signal`] - Observable values
//! - [`config`] - Configuration from defaults or environment
//! - [`telemetry`] - Logging setup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod remote;
pub mod signal;
pub mod stores;
pub mod strategy;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use cache::{DEFAULT_CACHE_KEY, FileCache, MemoryCache, PersistentCache};
pub use config::{ConfigError, SyncConfig};
pub use context::AppContext;
pub use error::{CacheError, RemoteError, SyncError};
pub use remote::{DEFAULT_BASE_URL, HttpClient, RemoteClient};
pub use signal::{ReadSignal, Signal};
pub use stores::{
    ProductSource, ProductStore, ProductStoreBuilder, PurchaseSource, PurchaseStore,
    seed_products,
};
pub use strategy::SyncStrategy;
pub use telemetry::LogFormat;
