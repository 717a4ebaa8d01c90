//! Same-process event bus backend.
//!
//! Signals bound to an event type hold the payload of the most recent event
//! of that type. Events dispatched by someone else notify the signal's
//! subscribers; events the storage dispatches itself carry
//! [`INTERNAL_SENDER`] and only update the held value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ChangeNotifier, StorageAdapter};

/// Sender marker on events dispatched by [`EventBusStorage::set`].
pub const INTERNAL_SENDER: &str = "__internal__";

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// One dispatched event.
#[derive(Debug, Clone)]
pub struct BusEvent<T> {
    pub data: T,
    pub sender: Option<String>,
}

type Listener<T> = Rc<dyn Fn(&BusEvent<T>)>;

struct BusState<T> {
    listeners: IndexMap<String, Vec<(ListenerId, Listener<T>)>>,
    next_id: u64,
}

/// An in-process bus carrying events of type `T`, keyed by event type.
///
/// Clones share listeners.
pub struct EventBus<T> {
    state: Rc<RefCell<BusState<T>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                listeners: IndexMap::new(),
                next_id: 0,
            })),
        }
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone + 'static> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &self,
        event_type: impl Into<String>,
        listener: impl Fn(&BusEvent<T>) + 'static,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state
            .listeners
            .entry(event_type.into())
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn remove_listener(&self, event_type: &str, id: ListenerId) {
        if let Some(listeners) = self.state.borrow_mut().listeners.get_mut(event_type) {
            listeners.retain(|(candidate, _)| *candidate != id);
        }
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Deliver an event from an outside sender.
    pub fn dispatch(&self, event_type: &str, data: T) {
        self.dispatch_event(event_type, BusEvent { data, sender: None });
    }

    /// Deliver an event tagged with `sender`.
    pub fn dispatch_from(&self, event_type: &str, data: T, sender: &str) {
        self.dispatch_event(
            event_type,
            BusEvent {
                data,
                sender: Some(sender.to_owned()),
            },
        );
    }

    fn dispatch_event(&self, event_type: &str, event: BusEvent<T>) {
        // Listeners may dispatch or (un)register while we deliver.
        let listeners: Vec<Listener<T>> = self
            .state
            .borrow()
            .listeners
            .get(event_type)
            .map(|entries| entries.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();

        tracing::trace!(event_type, listeners = listeners.len(), "dispatching event");
        for listener in listeners {
            listener(&event);
        }
    }
}

/// Storage adapter holding the latest payload of one event type.
pub struct EventBusStorage<T: Clone + 'static> {
    bus: EventBus<T>,
    event_type: String,
    value: Rc<RefCell<T>>,
    on_change: Rc<RefCell<Option<ChangeNotifier>>>,
    listener: Cell<Option<ListenerId>>,
}

impl<T: Clone + 'static> EventBusStorage<T> {
    pub fn new(bus: EventBus<T>, event_type: impl Into<String>, value: T) -> Self {
        let event_type = event_type.into();
        let value = Rc::new(RefCell::new(value));
        let on_change: Rc<RefCell<Option<ChangeNotifier>>> = Rc::new(RefCell::new(None));

        let listener = bus.add_listener(event_type.clone(), {
            let value = Rc::clone(&value);
            let on_change = Rc::clone(&on_change);
            move |event: &BusEvent<T>| {
                *value.borrow_mut() = event.data.clone();
                if event.sender.as_deref() == Some(INTERNAL_SENDER) {
                    return;
                }
                let notify = on_change.borrow().clone();
                if let Some(notify) = notify {
                    notify();
                }
            }
        });

        Self {
            bus,
            event_type,
            value,
            on_change,
            listener: Cell::new(Some(listener)),
        }
    }
}

impl<T: Clone + 'static> StorageAdapter<T> for EventBusStorage<T> {
    fn get(&self) -> T {
        self.value.borrow().clone()
    }

    fn set(&self, value: T) {
        if self.listener.get().is_none() {
            // Detached from the bus; keep the value locally.
            *self.value.borrow_mut() = value;
            return;
        }
        self.bus.dispatch_from(&self.event_type, value, INTERNAL_SENDER);
    }

    fn register_on_change(&self, notify: ChangeNotifier) {
        *self.on_change.borrow_mut() = Some(notify);
    }

    fn unsubscribe(&self) {
        if let Some(id) = self.listener.take() {
            self.bus.remove_listener(&self.event_type, id);
        }
    }
}

/// Storage factory binding a signal to `event_type` on `bus`.
pub fn use_event_bus<T: Clone + 'static>(
    bus: &EventBus<T>,
    event_type: impl Into<String>,
) -> impl FnOnce(T) -> EventBusStorage<T> {
    let bus = bus.clone();
    let event_type = event_type.into();
    move |value| EventBusStorage::new(bus, event_type, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal, SignalOptions};

    #[test]
    fn outside_events_update_value_and_notify() {
        let bus = EventBus::new();
        let signal = Signal::with_options(
            String::new(),
            SignalOptions::new().storage(use_event_bus(&bus, "chat")),
        );

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _effect = Effect::new({
            let signal = signal.clone();
            let seen = seen.clone();
            move || {
                seen.borrow_mut().push(signal.get());
                Ok(())
            }
        })
        .unwrap();

        bus.dispatch("chat", "hello".to_string());
        assert_eq!(signal.peek(), "hello");
        assert_eq!(*seen.borrow(), vec!["".to_string(), "hello".to_string()]);
    }

    #[test]
    fn own_writes_do_not_trigger_change_callback() {
        let bus = EventBus::new();
        let storage = EventBusStorage::new(bus.clone(), "count", 0);
        let calls = Rc::new(Cell::new(0));
        storage.register_on_change({
            let calls = calls.clone();
            Rc::new(move || calls.set(calls.get() + 1))
        });

        storage.set(5);
        assert_eq!(storage.get(), 5);
        assert_eq!(calls.get(), 0);

        bus.dispatch("count", 6);
        assert_eq!(storage.get(), 6);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unsubscribe_detaches_from_bus() {
        let bus = EventBus::new();
        let storage = EventBusStorage::new(bus.clone(), "count", 0);
        assert_eq!(bus.listener_count("count"), 1);

        storage.unsubscribe();
        assert_eq!(bus.listener_count("count"), 0);

        bus.dispatch("count", 3);
        assert_eq!(storage.get(), 0);

        storage.set(4);
        assert_eq!(storage.get(), 4);
    }
}
