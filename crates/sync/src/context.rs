//! Application context: the two stores, wired together.

use std::sync::Arc;

use tally_core::Purchase;
use tracing::{info, instrument, warn};

use crate::cache::{FileCache, MemoryCache, PersistentCache};
use crate::config::SyncConfig;
use crate::error::RemoteError;
use crate::remote::{HttpClient, RemoteClient};
use crate::stores::{ProductSource, ProductStore, PurchaseSource, PurchaseStore};
use crate::strategy::SyncStrategy;

/// Shared state handed to every view.
///
/// Cheap to clone; clones share the same stores.
#[derive(Debug, Clone)]
pub struct AppContext {
    products: ProductStore,
    purchases: PurchaseStore,
}

impl AppContext {
    /// Build both stores from `config`.
    ///
    /// The HTTP client is only created when a store is remote-backed. The
    /// product cache lives in `config.cache_dir` when set, in memory
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the HTTP client cannot be created.
    pub fn from_config(config: &SyncConfig) -> Result<Self, RemoteError> {
        let remote: Option<Arc<dyn RemoteClient>> = if config.needs_remote() {
            Some(Arc::new(HttpClient::new(
                &config.api_base_url,
                config.request_timeout,
            )?))
        } else {
            None
        };

        let product_source = match (config.product_strategy, &remote) {
            (SyncStrategy::Remote, Some(client)) => ProductSource::Remote(Arc::clone(client)),
            _ => ProductSource::Local(product_cache(config)),
        };
        let purchase_source = match (config.purchase_strategy, &remote) {
            (SyncStrategy::Remote, Some(client)) => PurchaseSource::Remote(Arc::clone(client)),
            _ => PurchaseSource::Local,
        };

        let products = ProductStore::builder(product_source)
            .cache_key(config.cache_key.clone())
            .request_timeout(config.request_timeout)
            .low_stock_threshold(config.low_stock_threshold)
            .build();
        let purchases = PurchaseStore::new(purchase_source, config.request_timeout);

        info!(
            products = %products.strategy(),
            purchases = %purchases.strategy(),
            "Stores configured"
        );
        Ok(Self::new(products, purchases))
    }

    #[must_use]
    pub const fn new(products: ProductStore, purchases: PurchaseStore) -> Self {
        Self {
            products,
            purchases,
        }
    }

    #[must_use]
    pub const fn products(&self) -> &ProductStore {
        &self.products
    }

    #[must_use]
    pub const fn purchases(&self) -> &PurchaseStore {
        &self.purchases
    }

    /// Initial load of both stores, run concurrently.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        tokio::join!(self.products.load(), self.purchases.fetch_purchases());
    }

    /// Record a sale, then take the sold units out of stock.
    ///
    /// Stock is only touched once the purchase store has accepted the sale.
    /// Returns the recorded purchase, or `None` if it was rejected.
    #[instrument(skip(self, purchase), fields(items = purchase.items.len()))]
    pub async fn record_sale(&self, purchase: Purchase) -> Option<Purchase> {
        let recorded = self.purchases.add_purchase(purchase).await?;
        let missing = self.products.deduct_sold(&recorded).await;
        if !missing.is_empty() {
            warn!(?missing, "Sold products are not in the catalog");
        }
        Some(recorded)
    }
}

fn product_cache(config: &SyncConfig) -> Arc<dyn PersistentCache> {
    match &config.cache_dir {
        Some(dir) => Arc::new(FileCache::new(dir.clone())),
        None => Arc::new(MemoryCache::new()),
    }
}
