//! Reactive values with change notification.
//!
//! A [`Signal`] holds a value and tells two kinds of subscribers about every
//! change:
//!
//! - watch receivers from [`Signal::subscribe`], for async consumers that
//!   `await` the next change;
//! - listeners registered with [`Signal::on_change`], called synchronously
//!   right after the change, before the mutating call returns.
//!
//! Stores keep the writable `Signal` and hand out [`ReadSignal`] views, so
//! consumers can observe state but never mutate it directly.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

type Listener = Arc<dyn Fn() + Send + Sync>;

struct SignalInner<T> {
    tx: watch::Sender<T>,
    listeners: Mutex<Vec<Listener>>,
}

impl<T> SignalInner<T> {
    fn notify(&self) {
        // Snapshot so a listener may register further listeners.
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }
}

/// A writable reactive value.
///
/// Clones share the same value and subscribers.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T> {
    /// Create a signal holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self {
            inner: Arc::new(SignalInner {
                tx,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.tx.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.inner.tx.send_replace(value);
        self.inner.notify();
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.inner.tx.send_modify(f);
        self.inner.notify();
    }

    /// Mutate the value in place; subscribers are notified only if `f`
    /// returns `true`. Returns what `f` returned.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = self.inner.tx.send_if_modified(f);
        if changed {
            self.inner.notify();
        }
        changed
    }

    /// A watch receiver that wakes on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.tx.subscribe()
    }

    /// Register a listener called synchronously after every change.
    pub fn on_change(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.listeners.lock().push(Arc::new(listener));
    }

    /// A read-only view sharing this signal's value.
    #[must_use]
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Signal<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.tx.borrow().clone()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.inner.tx.borrow()).finish()
    }
}

/// A read-only view of a [`Signal`].
pub struct ReadSignal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> ReadSignal<T> {
    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.tx.borrow())
    }

    /// A watch receiver that wakes on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.tx.subscribe()
    }

    /// Register a listener called synchronously after every change.
    pub fn on_change(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.listeners.lock().push(Arc::new(listener));
    }
}

impl<T: Clone> ReadSignal<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.tx.borrow().clone()
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadSignal").field(&*self.inner.tx.borrow()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_set_and_get() {
        let signal = Signal::new(1);
        signal.set(2);
        assert_eq!(signal.get(), 2);
        assert_eq!(signal.read_only().get(), 2);
    }

    #[test]
    fn test_listeners_run_on_every_change() {
        let signal = Signal::new(Vec::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        signal.read_only().on_change(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        signal.update(|v| v.push(1));
        signal.set(vec![7, 8]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_sees_new_value() {
        let signal = Signal::new(0);
        let observed = Arc::new(AtomicUsize::new(0));
        let reader = signal.read_only();
        let sink = Arc::clone(&observed);
        signal.on_change(move || sink.store(reader.get(), Ordering::SeqCst));

        signal.set(5);
        assert_eq!(observed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_update_if_skips_notification_when_unchanged() {
        let signal = Signal::new(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        signal.on_change(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!signal.update_if(|_| false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(signal.update_if(|v| {
            *v += 1;
            true
        }));
        assert_eq!(signal.get(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_receiver_wakes() {
        let signal = Signal::new(false);
        let mut rx = signal.read_only().subscribe();

        signal.set(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = Signal::new("a".to_string());
        let other = signal.clone();
        other.set("b".to_string());
        assert_eq!(signal.get(), "b");
    }
}
