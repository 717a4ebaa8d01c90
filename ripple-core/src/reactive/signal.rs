//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read with [`Signal::get`] while an observer is on the
//!    observer stack, the signal adds that observer to its subscriber set.
//!
//! 2. When a signal is written with [`Signal::set`] and the new value differs
//!    from the current one, every subscriber is re-run before `set` returns.
//!
//! 3. Equal writes are no-ops: nothing is stored and nobody is notified.
//!
//! # Storage
//!
//! The value itself lives in a [`StorageAdapter`]. The default keeps it in
//! memory; see [`crate::storage`] for the other backends.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID (8 bytes)
//! - The storage adapter (boxed)
//! - An ordered set of subscriber handles (grows with number of dependents)

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indexmap::IndexMap;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::{ObserverHandle, Source, SubscriberId};
use crate::error::Result;
use crate::storage::{InMemoryStorage, StorageAdapter};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Equality used to decide whether a write changes anything.
pub type EqualsFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

type StorageFactory<T> = Box<dyn FnOnce(T) -> Box<dyn StorageAdapter<T>>>;

/// Options recognised when creating a signal.
///
/// | option     | default                   |
/// |------------|---------------------------|
/// | `equals`   | `PartialEq::eq`           |
/// | `debounce` | none, writes commit now   |
/// | `storage`  | [`InMemoryStorage`]       |
pub struct SignalOptions<T> {
    equals: Option<EqualsFn<T>>,
    debounce: Option<Duration>,
    storage: Option<StorageFactory<T>>,
}

impl<T> Default for SignalOptions<T> {
    fn default() -> Self {
        Self {
            equals: None,
            debounce: None,
            storage: None,
        }
    }
}

impl<T: 'static> SignalOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the equality used to suppress redundant writes.
    pub fn equals(mut self, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.equals = Some(Rc::new(equals));
        self
    }

    /// Coalesce writes: only the last value written within `delay` is
    /// committed, once the window has elapsed.
    ///
    /// Commits run as local tokio tasks, so the signal must be written from
    /// inside a [`tokio::task::LocalSet`].
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// Choose the storage backend. The factory receives the initial value.
    pub fn storage<A, F>(mut self, factory: F) -> Self
    where
        A: StorageAdapter<T> + 'static,
        F: FnOnce(T) -> A + 'static,
    {
        self.storage = Some(Box::new(move |value| Box::new(factory(value))));
        self
    }
}

struct Debounce {
    delay: Duration,
    generation: Cell<u64>,
}

/// Shared state behind every handle to one signal.
pub(crate) struct SignalInner<T: 'static> {
    id: u64,
    storage: Box<dyn StorageAdapter<T>>,
    subscribers: RefCell<IndexMap<SubscriberId, ObserverHandle>>,
    equals: EqualsFn<T>,
    debounce: Option<Debounce>,
    this: Weak<SignalInner<T>>,
}

impl<T: Clone + 'static> SignalInner<T> {
    fn create(
        storage: Box<dyn StorageAdapter<T>>,
        equals: EqualsFn<T>,
        debounce: Option<Duration>,
    ) -> Rc<Self> {
        let inner = Rc::new_cyclic(|this| SignalInner {
            id: next_signal_id(),
            storage,
            subscribers: RefCell::new(IndexMap::new()),
            equals,
            debounce: debounce.map(|delay| Debounce {
                delay,
                generation: Cell::new(0),
            }),
            this: this.clone(),
        });

        let weak = Rc::downgrade(&inner);
        inner.storage.register_on_change(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(error) = inner.notify_subscribers() {
                    tracing::error!(signal = inner.id, %error, "external change failed to propagate");
                }
            }
        }));

        inner
    }

    /// Subscribe the current observer, if there is one.
    fn track(&self) {
        let Some(observer) = ReactiveContext::current_observer() else {
            return;
        };

        let id = observer.subscriber_id();
        let inserted = {
            let mut subscribers = self.subscribers.borrow_mut();
            if subscribers.contains_key(&id) {
                false
            } else {
                subscribers.insert(id, observer.clone());
                true
            }
        };

        if inserted {
            let source: Weak<dyn Source> = self.this.clone();
            observer.depends_on(source);
        }
    }

    fn read(&self) -> T {
        self.track();
        self.storage.get()
    }

    fn peek(&self) -> T {
        self.storage.get()
    }

    /// Store `value` and notify, unless it equals the current value.
    fn commit(&self, value: T) -> Result<()> {
        let current = self.storage.get();
        if (self.equals)(&current, &value) {
            return Ok(());
        }

        self.storage.set(value);
        self.notify_subscribers()
    }

    fn write(&self, value: T) -> Result<()> {
        match &self.debounce {
            Some(debounce) => self.schedule_commit(debounce, value),
            None => self.commit(value),
        }
    }

    fn schedule_commit(&self, debounce: &Debounce, value: T) -> Result<()> {
        let generation = debounce.generation.get() + 1;
        let delay = debounce.delay;
        let weak = self.this.clone();
        Runtime::spawn_local("debounced signal write", async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let current = inner.debounce.as_ref().map(|d| d.generation.get());
            if current != Some(generation) {
                // A later write superseded this one.
                return;
            }

            tracing::trace!(signal = inner.id, "committing debounced write");
            let _ctx = ReactiveContext::untracked();
            if let Err(error) = inner.commit(value) {
                tracing::error!(signal = inner.id, %error, "debounced write failed to propagate");
            }
        })?;

        debounce.generation.set(generation);
        Ok(())
    }

    /// Re-run every subscriber, regardless of equality.
    ///
    /// Iterates over a snapshot, so subscribers may unsubscribe and
    /// resubscribe while being notified. Stops at the first error.
    pub(crate) fn notify_subscribers(&self) -> Result<()> {
        let subscribers: Vec<ObserverHandle> =
            self.subscribers.borrow().values().cloned().collect();

        tracing::trace!(signal = self.id, subscribers = subscribers.len(), "signal changed");

        for subscriber in subscribers {
            subscriber.notify()?;
        }
        Ok(())
    }
}

impl<T: 'static> Source for SignalInner<T> {
    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.subscribers.borrow_mut().shift_remove(&subscriber);
    }
}

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Signal;
///
/// let count = Signal::new(0);
///
/// // Read the value
/// assert_eq!(count.get(), 0);
///
/// // Update the value (notifies subscribers)
/// count.set(5).unwrap();
/// assert_eq!(count.peek(), 5);
/// ```
pub struct Signal<T: 'static> {
    pub(crate) inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new in-memory signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self::with_options(value, SignalOptions::default())
    }

    /// Create a signal with explicit options.
    pub fn with_options(value: T, options: SignalOptions<T>) -> Self {
        let equals = options
            .equals
            .unwrap_or_else(|| Rc::new(|a: &T, b: &T| a == b));
        let storage = match options.storage {
            Some(factory) => factory(value),
            None => Box::new(InMemoryStorage::new(value)),
        };

        Self {
            inner: SignalInner::create(storage, equals, options.debounce),
        }
    }

    /// Create a signal backed by an existing adapter. The adapter already
    /// holds the initial value.
    pub fn from_storage(storage: impl StorageAdapter<T> + 'static) -> Self {
        Self {
            inner: SignalInner::create(Box::new(storage), Rc::new(|a: &T, b: &T| a == b), None),
        }
    }
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Create an in-memory signal for a type without `PartialEq`, using
    /// `equals` to detect redundant writes.
    pub fn with_equality(value: T, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            inner: SignalInner::create(Box::new(InMemoryStorage::new(value)), Rc::new(equals), None),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        self.inner.read()
    }

    /// Get the current value without tracking dependencies.
    ///
    /// Use this inside an effect that writes the same signal it reads, to
    /// avoid re-triggering itself.
    pub fn peek(&self) -> T {
        self.inner.peek()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Returns the first error raised by a subscriber that re-ran because of
    /// this write.
    pub fn set(&self, value: T) -> Result<()> {
        self.inner.write(value)
    }

    /// Update the value using a function of the current (untracked) value.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.peek());
        self.set(next)
    }

    /// A view exposing only the tracked read.
    pub fn read_only(&self) -> ReadOnlySignal<T> {
        ReadOnlySignal {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Tear down the storage backend's external subscription, if any.
    pub fn unsubscribe(&self) {
        self.inner.storage.unsubscribe();
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &self.peek())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Read-only view of a signal.
pub struct ReadOnlySignal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + 'static> ReadOnlySignal<T> {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Tracked read.
    pub fn get(&self) -> T {
        self.inner.read()
    }

    /// Untracked read.
    pub fn peek(&self) -> T {
        self.inner.peek()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: 'static> Clone for ReadOnlySignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for ReadOnlySignal<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlySignal")
            .field("id", &self.id())
            .field("value", &self.peek())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
