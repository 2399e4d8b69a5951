//! Shared observable values with synchronous change propagation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use super::batch;

static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalInner<T> {
    id: u64,
    value: watch::Sender<T>,
    version: AtomicU64,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_subscriber: AtomicU64,
    /// Subscriptions that feed this signal (derived signals only).
    upstream: Mutex<Vec<Subscription>>,
}

impl<T: Clone> SignalInner<T> {
    fn notify_now(&self) {
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        if callbacks.is_empty() {
            return;
        }
        // Clone out so callbacks may write back into this signal.
        let value = self.value.borrow().clone();
        for callback in callbacks {
            callback(&value);
        }
    }
}

/// A shared, version-tracked value.
///
/// Cloning a `Signal` yields another handle to the same value. Writes that do
/// not change the value (by `PartialEq`) are no-ops: no version bump and no
/// notification. Subscribers run synchronously, in registration order, on the
/// writing thread (or when the enclosing [`BatchScope`] closes).
///
/// [`BatchScope`]: super::BatchScope
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            inner: Arc::new(SignalInner {
                id: NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed),
                value: sender,
                version: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
                upstream: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value. Do not write to this signal inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of changing writes applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Replace the value. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        let changed = self.inner.value.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        self.after_write(changed)
    }

    /// Compute the next value from the current one, atomically with respect
    /// to other writers.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let changed = self.inner.value.send_if_modified(|current| {
            let next = f(current);
            if next == *current {
                false
            } else {
                *current = next;
                true
            }
        });
        self.after_write(changed)
    }

    /// Edit a copy of the current value in place and commit it.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        self.update(|current| {
            let mut next = current.clone();
            f(&mut next);
            next
        })
    }

    /// Register a change callback. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let callback: Callback<T> = Arc::new(callback);
        self.inner.subscribers.lock().push((id, callback));

        let weak: Weak<SignalInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.lock().retain(|(sub, _)| *sub != id);
            }
        })
    }

    /// Async receiver that observes every committed value.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.inner.value.subscribe()
    }

    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    /// Whether two handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn after_write(&self, changed: bool) -> bool {
        if changed {
            self.inner.version.fetch_add(1, Ordering::AcqRel);
            self.notify();
        }
        changed
    }

    fn notify(&self) {
        let weak = Arc::downgrade(&self.inner);
        let deferred = batch::defer(
            self.inner.id,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.notify_now();
                }
            }),
        );
        if !deferred {
            self.inner.notify_now();
        }
    }

    fn keep_alive(&self, subscription: Subscription) {
        self.inner.upstream.lock().push(subscription);
    }
}

/// Read-only handle to a [`Signal`].
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.signal, f)
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn version(&self) -> u64 {
        self.signal.version()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.signal.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<T> {
        self.signal.watch()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.signal.ptr_eq(&other.signal)
    }

    /// Derive a memoised signal. The derived value is recomputed on every
    /// upstream change but only notifies its own subscribers when the mapped
    /// result differs.
    pub fn map<U>(&self, f: impl Fn(&T) -> U + Send + Sync + 'static) -> ReadSignal<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let derived = Signal::new(self.with(|value| f(value)));

        let weak = Arc::downgrade(&derived.inner);
        let mapper = Arc::clone(&f);
        let subscription = self.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                Signal { inner }.set(mapper(value));
            }
        });
        derived.keep_alive(subscription);

        // Catch writes that landed between the initial read and subscribing.
        derived.set(self.with(|value| f(value)));
        derived.read_only()
    }
}

/// RAII guard for a signal callback; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
