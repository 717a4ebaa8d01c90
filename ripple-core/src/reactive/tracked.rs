//! Deeply Tracked Signals
//!
//! A [`TrackedSignal`] holds a dynamic [`Value`] and hands it out through the
//! membrane, so writes to nested properties notify the signal's subscribers
//! exactly like replacing the whole value does:
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use ripple_core::reactive::{Effect, TrackedSignal};
//! use ripple_core::value::Value;
//!
//! let cart = TrackedSignal::new(Value::object([("items", Value::array::<i32>([]))]));
//! let count = Rc::new(Cell::new(0));
//!
//! let _effect = Effect::new({
//!     let cart = cart.clone();
//!     let count = count.clone();
//!     move || {
//!         count.set(cart.get().get("items").as_proxy().map_or(0, |items| items.len()));
//!         Ok(())
//!     }
//! })
//! .unwrap();
//!
//! let items = cart.get().get("items");
//! items.as_proxy().unwrap().push("apple").unwrap();
//! assert_eq!(count.get(), 1);
//! ```
//!
//! Plain `Signal<Value>`s do not do this: mutating a nested node through a
//! value read from one goes unnoticed.

use std::fmt;
use std::rc::Rc;

use super::signal::{ReadOnlySignal, Signal, SignalOptions};
use crate::error::Result;
use crate::membrane::{Membrane, MembraneOptions, Wrapped};
use crate::value::Value;

/// A signal whose nested mutations are observable.
///
/// The root is compared by identity: setting a structurally equal but
/// distinct object still notifies. Every nested write notifies as well,
/// whether or not it changed anything visible to a particular subscriber.
#[derive(Clone)]
pub struct TrackedSignal {
    signal: Signal<Value>,
    membrane: Membrane,
}

impl TrackedSignal {
    pub fn new(value: Value) -> Self {
        Self::with_options(value, SignalOptions::new())
    }

    /// Create a tracked signal with explicit options. Any configured
    /// equality is replaced by identity comparison.
    pub fn with_options(value: Value, options: SignalOptions<Value>) -> Self {
        let signal = Signal::with_options(value, options.equals(Value::same_value));

        let weak = Rc::downgrade(&signal.inner);
        let membrane = Membrane::new(MembraneOptions::new().value_mutated(move |_, _| {
            match weak.upgrade() {
                Some(inner) => inner.notify_subscribers(),
                None => Ok(()),
            }
        }));

        Self { signal, membrane }
    }

    pub fn id(&self) -> u64 {
        self.signal.id()
    }

    /// Tracked read. Arrays and plain objects come back as writable proxies.
    pub fn get(&self) -> Wrapped {
        self.membrane.get_proxy(self.signal.get())
    }

    /// Untracked read.
    pub fn peek(&self) -> Wrapped {
        self.membrane.get_proxy(self.signal.peek())
    }

    /// Replace the root value. Proxies are unwrapped before being stored.
    pub fn set(&self, value: impl Into<Wrapped>) -> Result<()> {
        self.signal.set(value.into().to_value())
    }

    /// A view that only hands out read-only proxies.
    pub fn read_only(&self) -> ReadOnlyTrackedSignal {
        ReadOnlyTrackedSignal {
            signal: self.signal.read_only(),
            membrane: self.membrane.clone(),
        }
    }

    pub fn membrane(&self) -> &Membrane {
        &self.membrane
    }

    pub fn subscriber_count(&self) -> usize {
        self.signal.subscriber_count()
    }
}

impl fmt::Debug for TrackedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedSignal")
            .field("id", &self.id())
            .field("value", &self.signal.peek())
            .field("revision", &self.membrane.revision())
            .finish()
    }
}

/// Read-only view of a [`TrackedSignal`].
#[derive(Clone)]
pub struct ReadOnlyTrackedSignal {
    signal: ReadOnlySignal<Value>,
    membrane: Membrane,
}

impl ReadOnlyTrackedSignal {
    pub fn get(&self) -> Wrapped {
        self.membrane.get_read_only_proxy(self.signal.get())
    }

    pub fn peek(&self) -> Wrapped {
        self.membrane.get_read_only_proxy(self.signal.peek())
    }
}

impl fmt::Debug for ReadOnlyTrackedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyTrackedSignal")
            .field("id", &self.signal.id())
            .finish()
    }
}
