//! Product catalog store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tally_core::{Price, Product, ProductId, Purchase, StockStatus};
use tracing::{debug, instrument, warn};

use super::{ErrorSlot, LoadTracker, clear_error, record_error, seed_products, with_deadline};
use crate::cache::{DEFAULT_CACHE_KEY, PersistentCache};
use crate::error::{CacheError, SyncError};
use crate::remote::RemoteClient;
use crate::signal::{ReadSignal, Signal};
use crate::strategy::SyncStrategy;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Where a [`ProductStore`] gets its catalog from.
#[derive(Clone)]
pub enum ProductSource {
    /// `GET /products` on the remote service.
    Remote(Arc<dyn RemoteClient>),
    /// A snapshot in the persistent cache, written through on every change.
    Local(Arc<dyn PersistentCache>),
}

impl ProductSource {
    #[must_use]
    pub const fn strategy(&self) -> SyncStrategy {
        match self {
            Self::Remote(_) => SyncStrategy::Remote,
            Self::Local(_) => SyncStrategy::Local,
        }
    }
}

/// Builder for [`ProductStore`].
pub struct ProductStoreBuilder {
    source: ProductSource,
    cache_key: String,
    seed: Vec<Product>,
    request_timeout: Option<Duration>,
    low_stock_threshold: u32,
}

impl ProductStoreBuilder {
    /// Cache key of the snapshot (local strategy). Default: `productsData`.
    #[must_use]
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Catalog restored when the cache has no usable snapshot.
    #[must_use]
    pub fn seed(mut self, seed: Vec<Product>) -> Self {
        self.seed = seed;
        self
    }

    /// Deadline for remote calls and cache access; `None` waits forever.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    #[must_use]
    pub fn build(self) -> ProductStore {
        ProductStore {
            inner: Arc::new(ProductStoreInner {
                source: self.source,
                cache_key: self.cache_key,
                seed: self.seed,
                request_timeout: self.request_timeout,
                low_stock_threshold: self.low_stock_threshold,
                products: Signal::new(Vec::new()),
                error: Signal::new(None),
                tracker: LoadTracker::new(),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

/// Reactive product catalog.
///
/// Cheap to clone; clones share one catalog.
///
/// # Strategies
///
/// - **Remote**: [`load`](Self::load) replaces the catalog with
///   `GET /products`. Local mutations stay in memory until the next
///   [`refresh`](Self::refresh).
/// - **Local**: [`load`](Self::load) reads the cached snapshot, falling back
///   to the seed catalog (and persisting it) when the snapshot is missing or
///   corrupt. Every mutation writes the whole catalog back to the cache
///   before returning.
#[derive(Clone)]
pub struct ProductStore {
    inner: Arc<ProductStoreInner>,
}

struct ProductStoreInner {
    source: ProductSource,
    cache_key: String,
    seed: Vec<Product>,
    request_timeout: Option<Duration>,
    low_stock_threshold: u32,
    products: Signal<Vec<Product>>,
    error: ErrorSlot,
    tracker: LoadTracker,
    /// Held from serializing a snapshot until the cache has stored it, so
    /// snapshots reach the cache in the order they were taken.
    write_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("strategy", &self.strategy())
            .field("products", &self.inner.products.with(Vec::len))
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl ProductStore {
    /// Start building a store over `source`.
    #[must_use]
    pub fn builder(source: ProductSource) -> ProductStoreBuilder {
        ProductStoreBuilder {
            source,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            seed: seed_products(),
            request_timeout: Some(DEFAULT_TIMEOUT),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Remote-backed store with default settings.
    #[must_use]
    pub fn remote(client: Arc<dyn RemoteClient>) -> Self {
        Self::builder(ProductSource::Remote(client)).build()
    }

    /// Local-only store with default settings.
    #[must_use]
    pub fn local(cache: Arc<dyn PersistentCache>) -> Self {
        Self::builder(ProductSource::Local(cache)).build()
    }

    #[must_use]
    pub fn strategy(&self) -> SyncStrategy {
        self.inner.source.strategy()
    }

    // =========================================================================
    // Reactive state
    // =========================================================================

    /// The catalog.
    #[must_use]
    pub fn products(&self) -> ReadSignal<Vec<Product>> {
        self.inner.products.read_only()
    }

    /// True while a [`load`](Self::load) is in flight.
    #[must_use]
    pub fn loading(&self) -> ReadSignal<bool> {
        self.inner.tracker.loading.read_only()
    }

    /// Last failure; cleared by the next successful [`load`](Self::load).
    #[must_use]
    pub fn error(&self) -> ReadSignal<Option<Arc<SyncError>>> {
        self.inner.error.read_only()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Product> {
        self.inner.products.get()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.tracker.loading.get()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<Arc<SyncError>> {
        self.inner.error.get()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Populate the catalog from the configured source.
    ///
    /// Never fails: a failure leaves the previous catalog in place and is
    /// reported through [`error`](Self::error).
    #[instrument(skip(self), fields(strategy = %self.strategy()))]
    pub async fn load(&self) {
        let guard = self.inner.tracker.begin();
        match &self.inner.source {
            ProductSource::Remote(client) => {
                let result = with_deadline(self.inner.request_timeout, client.list_products()).await;
                if !guard.is_latest() {
                    debug!(ticket = guard.ticket, "Discarding stale product response");
                    return;
                }
                match result {
                    Ok(products) => {
                        debug!(count = products.len(), "Loaded products from remote service");
                        self.inner.products.set(dedupe(products));
                        clear_error(&self.inner.error);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to load products");
                        record_error(&self.inner.error, e);
                    }
                }
            }
            ProductSource::Local(cache) => {
                let read = with_deadline(
                    self.inner.request_timeout,
                    cache.get(&self.inner.cache_key),
                )
                .await;
                if !guard.is_latest() {
                    debug!(ticket = guard.ticket, "Discarding stale cache read");
                    return;
                }
                self.apply_cached(read).await;
            }
        }
    }

    /// Re-run [`load`](Self::load).
    pub async fn refresh(&self) {
        self.load().await;
    }

    async fn apply_cached(&self, read: Result<Option<String>, SyncError>) {
        match read {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Product>>(&blob) {
                Ok(products) => {
                    debug!(count = products.len(), "Loaded products from cache");
                    self.inner.products.set(dedupe(products));
                    clear_error(&self.inner.error);
                }
                Err(e) => {
                    warn!(error = %e, "Cached products are corrupt, restoring seed catalog");
                    self.restore_seed().await;
                }
            },
            Ok(None) => {
                debug!("No cached products, restoring seed catalog");
                self.restore_seed().await;
            }
            Err(e) => {
                // The snapshot may be intact; keep it on disk and run on the
                // seed in memory.
                warn!(error = %e, "Failed to read product cache, using seed catalog");
                self.inner.products.set(self.inner.seed.clone());
                record_error(&self.inner.error, e);
            }
        }
    }

    async fn restore_seed(&self) {
        self.inner.products.set(self.inner.seed.clone());
        if self.persist().await {
            clear_error(&self.inner.error);
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert `product`, or replace the product with the same id in place.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert_product(&self, product: Product) {
        self.inner.products.update(|products| {
            match products.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => *existing = product,
                None => products.push(product),
            }
        });
        self.write_through().await;
    }

    /// Set the stock of a product. Returns whether the product exists.
    #[instrument(skip(self))]
    pub async fn update_stock(&self, id: &ProductId, quantity: u32) -> bool {
        self.mutate(id, |p| p.quantity = quantity).await
    }

    /// Add `delta` (may be negative) to the stock of a product, saturating
    /// at zero. Returns whether the product exists.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, id: &ProductId, delta: i64) -> bool {
        self.mutate(id, |p| p.quantity = apply_delta(p.quantity, delta)).await
    }

    /// Set the unit price of a product. Returns whether the product exists.
    #[instrument(skip(self))]
    pub async fn update_price(&self, id: &ProductId, price: Price) -> bool {
        self.mutate(id, |p| p.price = price).await
    }

    /// Set or clear the expiry date of a product. Returns whether the
    /// product exists.
    #[instrument(skip(self))]
    pub async fn set_expiry(&self, id: &ProductId, expiry: Option<NaiveDate>) -> bool {
        self.mutate(id, |p| p.expiry = expiry).await
    }

    /// Take the units sold in `purchase` out of stock, in one change.
    ///
    /// Returns the ids of sold products that are not in the catalog.
    #[instrument(skip(self, purchase), fields(items = purchase.items.len()))]
    pub async fn deduct_sold(&self, purchase: &Purchase) -> Vec<ProductId> {
        let mut missing = Vec::new();
        let changed = self.inner.products.update_if(|products| {
            let mut changed = false;
            for line in &purchase.items {
                match products.iter_mut().find(|p| p.id == line.product_id) {
                    Some(product) => {
                        product.quantity = product.quantity.saturating_sub(line.quantity);
                        changed = true;
                    }
                    None => missing.push(line.product_id.clone()),
                }
            }
            changed
        });
        if changed {
            self.write_through().await;
        }
        missing
    }

    async fn mutate(&self, id: &ProductId, f: impl FnOnce(&mut Product)) -> bool {
        let found = self
            .inner
            .products
            .update_if(|products| products.iter_mut().find(|p| &p.id == id).map(f).is_some());
        if found {
            self.write_through().await;
        } else {
            debug!(product_id = %id, "No such product, nothing changed");
        }
        found
    }

    async fn write_through(&self) {
        if matches!(self.inner.source, ProductSource::Remote(_)) {
            debug!("Change kept in memory until the next refresh");
            return;
        }
        self.persist().await;
    }

    /// Write the whole catalog to the cache. Returns whether it was stored.
    ///
    /// Writes are not cut short by the request timeout: an abandoned write
    /// could still land after a newer one.
    async fn persist(&self) -> bool {
        let ProductSource::Local(cache) = &self.inner.source else {
            return true;
        };
        let _guard = self.inner.write_lock.lock().await;
        let blob = match self.inner.products.with(|p| serde_json::to_string(p)) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize products");
                record_error(&self.inner.error, CacheError::from(e).into());
                return false;
            }
        };
        match cache.set(&self.inner.cache_key, &blob).await {
            Ok(()) => {
                debug!(bytes = blob.len(), "Persisted products");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist products");
                record_error(&self.inner.error, e.into());
                false
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.inner
            .products
            .with(|products| products.iter().find(|p| &p.id == id).cloned())
    }

    /// Products whose name or category contains `query` (case-insensitive).
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        self.filtered(|p| p.matches(query))
    }

    /// Products at or past their expiry date on `today`.
    #[must_use]
    pub fn expired(&self, today: NaiveDate) -> Vec<Product> {
        self.filtered(|p| p.is_expired(today))
    }

    /// Products in stock but at or below the low-stock threshold.
    #[must_use]
    pub fn low_stock(&self) -> Vec<Product> {
        let threshold = self.inner.low_stock_threshold;
        self.filtered(|p| p.quantity > 0 && p.quantity <= threshold)
    }

    #[must_use]
    pub fn out_of_stock(&self) -> Vec<Product> {
        self.filtered(|p| p.quantity == 0)
    }

    /// Value of all stock on hand.
    #[must_use]
    pub fn inventory_value(&self) -> Price {
        self.inner
            .products
            .with(|products| products.iter().map(Product::stock_value).sum())
    }

    #[must_use]
    pub fn low_stock_threshold(&self) -> u32 {
        self.inner.low_stock_threshold
    }

    /// Stock status of a product on `today`, against the store's low-stock
    /// threshold.
    #[must_use]
    pub fn status_of(&self, id: &ProductId, today: NaiveDate) -> Option<StockStatus> {
        let threshold = self.inner.low_stock_threshold;
        self.inner.products.with(|products| {
            products
                .iter()
                .find(|p| &p.id == id)
                .map(|p| p.stock_status(today, threshold))
        })
    }

    /// Products that can go on a bill today: in stock and not expired.
    #[must_use]
    pub fn sellable(&self, today: NaiveDate) -> Vec<Product> {
        let threshold = self.inner.low_stock_threshold;
        self.filtered(|p| p.stock_status(today, threshold).is_sellable())
    }

    fn filtered(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.inner
            .products
            .with(|products| products.iter().filter(|p| keep(p)).cloned().collect())
    }
}

fn apply_delta(quantity: u32, delta: i64) -> u32 {
    let updated = i64::from(quantity).saturating_add(delta).max(0);
    u32::try_from(updated).unwrap_or(u32::MAX)
}

/// Keep the first product for each id.
fn dedupe(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::with_capacity(products.len());
    let before = products.len();
    let unique: Vec<Product> = products
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    if unique.len() != before {
        warn!(dropped = before - unique.len(), "Dropped products with duplicate ids");
    }
    unique
}
