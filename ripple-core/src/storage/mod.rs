//! Storage Adapters
//!
//! A signal never owns its value directly; it reads and writes it through a
//! [`StorageAdapter`]. The default keeps the value in memory. Other backends
//! persist it somewhere else or receive changes from outside the reactive
//! graph, in which case they call the notifier handed to them through
//! [`StorageAdapter::register_on_change`].
//!
//! Adapters take `&self` everywhere. A write on one signal can synchronously
//! reach another signal's adapter (see [`EventBusStorage`]), so adapters keep
//! their state behind their own interior mutability instead of relying on the
//! signal to hand out exclusive access.

mod channel;
mod event_bus;
mod key_value;

use std::cell::RefCell;
use std::rc::Rc;

pub use channel::{
    use_channel, ChannelErrorHandler, ChannelStorage, InMemoryChannel, MessageChannel,
    MessageHandler, ReplayPosition, SubscriptionId,
};
pub use event_bus::{use_event_bus, BusEvent, EventBus, EventBusStorage, ListenerId, INTERNAL_SENDER};
pub use key_value::{use_key_value, KeyValueStorage, KeyValueStore};

/// Callback a backend invokes when its value changed behind the signal's back.
pub type ChangeNotifier = Rc<dyn Fn()>;

/// The contract a storage backend must satisfy.
pub trait StorageAdapter<T> {
    /// Current value.
    fn get(&self) -> T;

    /// Replace the value.
    fn set(&self, value: T);

    /// Install the callback for backend-initiated changes.
    fn register_on_change(&self, _notify: ChangeNotifier) {}

    /// Tear down any external subscription the backend holds.
    fn unsubscribe(&self) {}
}

impl<T, A> StorageAdapter<T> for Rc<A>
where
    A: StorageAdapter<T> + ?Sized,
{
    fn get(&self) -> T {
        (**self).get()
    }

    fn set(&self, value: T) {
        (**self).set(value)
    }

    fn register_on_change(&self, notify: ChangeNotifier) {
        (**self).register_on_change(notify)
    }

    fn unsubscribe(&self) {
        (**self).unsubscribe()
    }
}

/// Default backend: the value lives in memory next to the signal.
pub struct InMemoryStorage<T> {
    value: RefCell<T>,
}

impl<T> InMemoryStorage<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }
}

impl<T: Clone> StorageAdapter<T> for InMemoryStorage<T> {
    fn get(&self) -> T {
        self.value.borrow().clone()
    }

    fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

/// Backend assembled from a getter and a setter closure.
pub struct FnStorage<T> {
    get: Box<dyn Fn() -> T>,
    set: Box<dyn Fn(T)>,
}

/// Build a storage adapter from plain closures.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use ripple_core::storage::{create_storage, StorageAdapter};
///
/// let log = Rc::new(RefCell::new(vec![0]));
/// let storage = create_storage(
///     { let log = log.clone(); move || *log.borrow().last().unwrap() },
///     { let log = log.clone(); move |v| log.borrow_mut().push(v) },
/// );
/// storage.set(3);
/// assert_eq!(storage.get(), 3);
/// assert_eq!(*log.borrow(), vec![0, 3]);
/// ```
pub fn create_storage<T>(get: impl Fn() -> T + 'static, set: impl Fn(T) + 'static) -> FnStorage<T> {
    FnStorage {
        get: Box::new(get),
        set: Box::new(set),
    }
}

impl<T> StorageAdapter<T> for FnStorage<T> {
    fn get(&self) -> T {
        (self.get)()
    }

    fn set(&self, value: T) {
        (self.set)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;

    /// History-keeping backend built on `create_storage`.
    struct Undo<T> {
        history: Rc<RefCell<Vec<T>>>,
        storage: FnStorage<T>,
    }

    impl<T: Clone + 'static> Undo<T> {
        fn new(value: T) -> Self {
            let history = Rc::new(RefCell::new(vec![value]));
            let storage = create_storage(
                {
                    let history = history.clone();
                    move || history.borrow().last().cloned().unwrap()
                },
                {
                    let history = history.clone();
                    move |value| history.borrow_mut().push(value)
                },
            );
            Self { history, storage }
        }

        fn undo(&self) {
            let mut history = self.history.borrow_mut();
            if history.len() > 1 {
                history.pop();
            }
        }
    }

    impl<T> StorageAdapter<T> for Undo<T> {
        fn get(&self) -> T {
            self.storage.get()
        }

        fn set(&self, value: T) {
            self.storage.set(value)
        }
    }

    #[test]
    fn in_memory_storage_round_trips() {
        let storage = InMemoryStorage::new(1);
        assert_eq!(storage.get(), 1);
        storage.set(2);
        assert_eq!(storage.get(), 2);
    }

    #[test]
    fn shared_adapter_forwards_calls() {
        let storage = Rc::new(InMemoryStorage::new("a".to_string()));
        let shared: Box<dyn StorageAdapter<String>> = Box::new(storage.clone());

        shared.set("b".into());
        assert_eq!(storage.get(), "b");
    }

    #[test]
    fn custom_storage_keeps_its_own_api() {
        let undo = Rc::new(Undo::new(0));
        let signal = Signal::from_storage(undo.clone());
        assert_eq!(signal.get(), 0);

        signal.set(1).unwrap();
        assert_eq!(signal.get(), 1);
        signal.set(2).unwrap();
        assert_eq!(signal.get(), 2);

        undo.undo();
        assert_eq!(signal.get(), 1);
        undo.undo();
        assert_eq!(signal.get(), 0);
        undo.undo();
        assert_eq!(signal.get(), 0);
    }
}
