//! Test doubles for the remote service and the cache.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tally_core::{Product, Purchase, PurchaseId};
use tokio::sync::oneshot;

use crate::cache::PersistentCache;
use crate::error::{CacheError, RemoteError};
use crate::remote::RemoteClient;

/// `503 Service Unavailable`.
pub fn unavailable() -> RemoteError {
    RemoteError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

type Outcome<T> = Result<T, RemoteError>;

enum Reply<T> {
    Ready(Outcome<T>),
    Deferred(oneshot::Receiver<Outcome<T>>),
    Never,
}

impl<T> Reply<T> {
    async fn resolve(self) -> Outcome<T> {
        match self {
            Self::Ready(outcome) => outcome,
            Self::Deferred(rx) => rx.await.unwrap_or_else(|_| Err(unavailable())),
            Self::Never => std::future::pending().await,
        }
    }
}

/// Remote service that answers from queued replies, in call order.
///
/// An empty product or purchase queue answers `503`. An empty creation queue
/// echoes the posted purchase back with id `srv-<n>`.
#[derive(Default)]
pub struct ScriptedRemote {
    products: Mutex<VecDeque<Reply<Vec<Product>>>>,
    purchases: Mutex<VecDeque<Reply<Vec<Purchase>>>>,
    created: Mutex<VecDeque<Reply<Purchase>>>,
    posted: Mutex<Vec<Purchase>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_products(&self, outcome: Outcome<Vec<Product>>) {
        self.products.lock().push_back(Reply::Ready(outcome));
    }

    /// Queue a reply that settles when the returned sender fires.
    pub fn defer_products(&self) -> oneshot::Sender<Outcome<Vec<Product>>> {
        let (tx, rx) = oneshot::channel();
        self.products.lock().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn hang_products(&self) {
        self.products.lock().push_back(Reply::Never);
    }

    pub fn reply_purchases(&self, outcome: Outcome<Vec<Purchase>>) {
        self.purchases.lock().push_back(Reply::Ready(outcome));
    }

    /// Queue a reply that settles when the returned sender fires.
    pub fn defer_purchases(&self) -> oneshot::Sender<Outcome<Vec<Purchase>>> {
        let (tx, rx) = oneshot::channel();
        self.purchases.lock().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn reply_created(&self, outcome: Outcome<Purchase>) {
        self.created.lock().push_back(Reply::Ready(outcome));
    }

    pub fn hang_created(&self) {
        self.created.lock().push_back(Reply::Never);
    }

    /// Every purchase submitted so far.
    pub fn posted(&self) -> Vec<Purchase> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl RemoteClient for ScriptedRemote {
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        let reply = self.products.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(unavailable()),
        }
    }

    async fn list_purchases(&self) -> Result<Vec<Purchase>, RemoteError> {
        let reply = self.purchases.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(unavailable()),
        }
    }

    async fn create_purchase(&self, purchase: &Purchase) -> Result<Purchase, RemoteError> {
        let count = {
            let mut posted = self.posted.lock();
            posted.push(purchase.clone());
            posted.len()
        };
        let reply = self.created.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(purchase
                .clone()
                .with_id(PurchaseId::from(format!("srv-{count}")))),
        }
    }
}

/// Cache whose reads or writes always fail.
pub struct FailingCache {
    fail_reads: bool,
    writes: AtomicUsize,
}

impl FailingCache {
    /// Reads fail; writes succeed and are counted.
    pub const fn on_read() -> Self {
        Self {
            fail_reads: true,
            writes: AtomicUsize::new(0),
        }
    }

    /// Reads find nothing; writes fail.
    pub const fn on_write() -> Self {
        Self {
            fail_reads: false,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn io_failure() -> CacheError {
    CacheError::Io(std::io::Error::other("disk unavailable"))
}

#[async_trait]
impl PersistentCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        if self.fail_reads {
            Err(io_failure())
        } else {
            Ok(None)
        }
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
        if self.fail_reads {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            Err(io_failure())
        }
    }
}
