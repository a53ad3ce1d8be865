//! Purchase ledger store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tally_core::{Price, ProductId, Purchase};
use tracing::{debug, info, instrument};

use super::{ErrorSlot, LoadTracker, clear_error, record_error, with_deadline};
use crate::error::{RemoteError, SyncError};
use crate::remote::RemoteClient;
use crate::signal::{ReadSignal, Signal};
use crate::strategy::SyncStrategy;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a [`PurchaseStore`] records sales.
#[derive(Clone)]
pub enum PurchaseSource {
    /// `GET /purchases` and `POST /purchases` on the remote service.
    Remote(Arc<dyn RemoteClient>),
    /// In memory only; nothing survives the process.
    Local,
}

impl PurchaseSource {
    #[must_use]
    pub const fn strategy(&self) -> SyncStrategy {
        match self {
            Self::Remote(_) => SyncStrategy::Remote,
            Self::Local => SyncStrategy::Local,
        }
    }
}

/// Reactive purchase ledger.
///
/// In remote mode the ledger only ever holds purchases the service has
/// confirmed. A submission that fails is kept aside in
/// [`rejected`](Self::rejected) so the caller can retry or discard it.
#[derive(Clone)]
pub struct PurchaseStore {
    inner: Arc<PurchaseStoreInner>,
}

struct PurchaseStoreInner {
    source: PurchaseSource,
    request_timeout: Option<Duration>,
    purchases: Signal<Vec<Purchase>>,
    rejected: Signal<Vec<Purchase>>,
    error: ErrorSlot,
    tracker: LoadTracker,
}

impl std::fmt::Debug for PurchaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseStore")
            .field("strategy", &self.strategy())
            .field("purchases", &self.inner.purchases.with(Vec::len))
            .field("rejected", &self.inner.rejected.with(Vec::len))
            .finish_non_exhaustive()
    }
}

impl PurchaseStore {
    #[must_use]
    pub fn new(source: PurchaseSource, request_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(PurchaseStoreInner {
                source,
                request_timeout,
                purchases: Signal::new(Vec::new()),
                rejected: Signal::new(Vec::new()),
                error: Signal::new(None),
                tracker: LoadTracker::new(),
            }),
        }
    }

    #[must_use]
    pub fn remote(client: Arc<dyn RemoteClient>) -> Self {
        Self::new(PurchaseSource::Remote(client), Some(DEFAULT_TIMEOUT))
    }

    #[must_use]
    pub fn local() -> Self {
        Self::new(PurchaseSource::Local, None)
    }

    #[must_use]
    pub fn strategy(&self) -> SyncStrategy {
        self.inner.source.strategy()
    }

    // =========================================================================
    // Reactive state
    // =========================================================================

    #[must_use]
    pub fn purchases(&self) -> ReadSignal<Vec<Purchase>> {
        self.inner.purchases.read_only()
    }

    #[must_use]
    pub fn loading(&self) -> ReadSignal<bool> {
        self.inner.tracker.loading.read_only()
    }

    #[must_use]
    pub fn error(&self) -> ReadSignal<Option<Arc<SyncError>>> {
        self.inner.error.read_only()
    }

    /// Submissions the remote service did not confirm, oldest first.
    #[must_use]
    pub fn rejected(&self) -> ReadSignal<Vec<Purchase>> {
        self.inner.rejected.read_only()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Purchase> {
        self.inner.purchases.get()
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
    // Operations
    // =========================================================================

    /// Replace the ledger with `GET /purchases`.
    ///
    /// A no-op for the local strategy, whose ledger has no other source.
    #[instrument(skip(self), fields(strategy = %self.strategy()))]
    pub async fn fetch_purchases(&self) {
        let PurchaseSource::Remote(client) = &self.inner.source else {
            debug!("Local purchase ledger, nothing to fetch");
            return;
        };

        let guard = self.inner.tracker.begin();
        let result = with_deadline(self.inner.request_timeout, client.list_purchases()).await;
        if !guard.is_latest() {
            debug!(ticket = guard.ticket, "Discarding stale purchase response");
            return;
        }
        match result {
            Ok(purchases) => {
                debug!(count = purchases.len(), "Loaded purchases from remote service");
                self.inner.purchases.set(purchases);
                clear_error(&self.inner.error);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch purchases");
                record_error(&self.inner.error, e);
            }
        }
    }

    /// Record a sale.
    ///
    /// Remote: submits `purchase` and appends the confirmed record, with the
    /// server-assigned id. A fetch still in flight is discarded when it
    /// settles, since its listing may predate the new record. On failure the ledger is untouched, the error slot
    /// is set, `purchase` is appended to [`rejected`](Self::rejected) and
    /// `None` is returned.
    ///
    /// Local: appends `purchase` as given and returns it.
    #[instrument(skip(self, purchase), fields(strategy = %self.strategy(), total = %purchase.total))]
    pub async fn add_purchase(&self, purchase: Purchase) -> Option<Purchase> {
        let PurchaseSource::Remote(client) = &self.inner.source else {
            self.inner.purchases.update(|ledger| ledger.push(purchase.clone()));
            return Some(purchase);
        };

        let result = with_deadline(self.inner.request_timeout, async {
            let confirmed = client.create_purchase(&purchase).await?;
            if confirmed.is_confirmed() {
                Ok(confirmed)
            } else {
                Err(RemoteError::MissingIdentifier)
            }
        })
        .await;

        match result {
            Ok(confirmed) => {
                info!(purchase_id = ?confirmed.id, "Purchase recorded");
                self.inner.tracker.invalidate();
                self.inner
                    .purchases
                    .update(|ledger| ledger.push(confirmed.clone()));
                Some(confirmed)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to record purchase");
                record_error(&self.inner.error, e);
                self.inner.rejected.update(|rejected| rejected.push(purchase));
                None
            }
        }
    }

    /// Drop every rejected submission.
    pub fn clear_rejected(&self) {
        self.inner
            .rejected
            .update_if(|rejected| !std::mem::take(rejected).is_empty());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sum of all purchase totals.
    #[must_use]
    pub fn total_revenue(&self) -> Price {
        self.inner
            .purchases
            .with(|ledger| ledger.iter().map(|p| p.total).sum())
    }

    /// Purchases made on `date` (UTC).
    #[must_use]
    pub fn purchases_on(&self, date: NaiveDate) -> Vec<Purchase> {
        self.inner.purchases.with(|ledger| {
            ledger
                .iter()
                .filter(|p| p.is_on(date))
                .cloned()
                .collect()
        })
    }

    /// Units of a product sold across the ledger.
    #[must_use]
    pub fn units_sold(&self, product_id: &ProductId) -> u64 {
        self.inner
            .purchases
            .with(|ledger| ledger.iter().map(|p| p.units_of(product_id)).sum())
    }
}
