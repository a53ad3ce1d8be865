//! Reactive stores for the product catalog and the purchase ledger.
//!
//! # Architecture
//!
//! - Each store exclusively owns its in-memory collection and exposes it as
//!   a [`ReadSignal`](crate::ReadSignal); consumers never mutate it directly.
//! - The backing source ([`SyncStrategy`](crate::SyncStrategy)) is fixed at
//!   construction.
//! - No failure escapes a store operation. Failures are logged and recorded
//!   in the store's error slot; the loading flag always settles.
//!
//! # Request ordering
//!
//! Every load takes a ticket. When responses arrive out of order, only the
//! response to the newest ticket is applied; older ones are dropped. The
//! loading flag stays up while any load is still in flight.

mod product;
mod purchase;
mod seed;

pub use product::{ProductSource, ProductStore, ProductStoreBuilder};
pub use purchase::{PurchaseSource, PurchaseStore};
pub use seed::seed_products;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::SyncError;
use crate::signal::Signal;

/// Tracks in-flight loads for one store.
struct LoadTracker {
    latest: AtomicU64,
    in_flight: AtomicUsize,
    loading: Signal<bool>,
}

impl LoadTracker {
    fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            loading: Signal::new(false),
        }
    }

    /// Start a load. The loading flag drops when the last guard is dropped,
    /// including when the load future itself is cancelled.
    fn begin(&self) -> InFlight<'_> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.loading.set(true);
        }
        InFlight {
            tracker: self,
            ticket,
        }
    }

    /// Make every load already in flight stale, without starting a new one.
    fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

struct InFlight<'a> {
    tracker: &'a LoadTracker,
    ticket: u64,
}

impl InFlight<'_> {
    /// Whether no newer load has started since this one.
    fn is_latest(&self) -> bool {
        self.tracker.latest.load(Ordering::SeqCst) == self.ticket
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.loading.set(false);
        }
    }
}

/// Last failure seen by a store.
type ErrorSlot = Signal<Option<Arc<SyncError>>>;

fn record_error(slot: &ErrorSlot, error: SyncError) {
    slot.set(Some(Arc::new(error)));
}

fn clear_error(slot: &ErrorSlot) {
    slot.update_if(|error| error.take().is_some());
}

/// Await `fut`, giving up after `timeout` if one is set.
async fn with_deadline<T, E>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, SyncError>
where
    SyncError: From<E>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SyncError::Timeout(limit))?
            .map_err(SyncError::from),
        None => fut.await.map_err(SyncError::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    #[test]
    fn test_loading_follows_outermost_guard() {
        let tracker = LoadTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(tracker.loading.get());
        assert!(!first.is_latest());
        assert!(second.is_latest());

        drop(second);
        assert!(tracker.loading.get());
        drop(first);
        assert!(!tracker.loading.get());
    }

    #[test]
    fn test_invalidate_makes_running_load_stale() {
        let tracker = LoadTracker::new();
        let running = tracker.begin();
        tracker.invalidate();
        assert!(!running.is_latest());
        assert!(tracker.loading.get());
        drop(running);
        assert!(!tracker.loading.get());
    }

    #[test]
    fn test_clear_error_notifies_only_when_set() {
        let slot: ErrorSlot = Signal::new(None);
        let mut rx = slot.subscribe();

        clear_error(&slot);
        assert!(!rx.has_changed().unwrap());

        record_error(&slot, SyncError::Timeout(Duration::from_secs(1)));
        let _ = rx.borrow_and_update();
        clear_error(&slot);
        assert!(rx.has_changed().unwrap());
        assert!(slot.get().is_none());
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result: Result<(), SyncError> = with_deadline(
            Some(Duration::from_millis(10)),
            std::future::pending::<Result<(), RemoteError>>(),
        )
        .await;
        assert!(matches!(result, Err(SyncError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_errors_through() {
        let result: Result<(), SyncError> = with_deadline(None, async {
            Err::<(), _>(RemoteError::MissingIdentifier)
        })
        .await;
        assert!(matches!(
            result,
            Err(SyncError::Remote(RemoteError::MissingIdentifier))
        ));
    }
}
