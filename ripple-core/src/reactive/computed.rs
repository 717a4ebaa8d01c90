//! Computed Implementation
//!
//! A Computed is a derived value kept up to date by an effect.
//!
//! # How Computed Values Work
//!
//! 1. On creation, the function runs inside an effect and its result is
//!    stored in an internal signal.
//!
//! 2. When anything the function read changes, the effect re-runs and
//!    writes the new result into the signal.
//!
//! 3. Readers subscribe to that internal signal, so a result equal to the
//!    previous one does not re-run them.
//!
//! Computed values are eager: they recompute as soon as an input changes,
//! whether or not anyone reads them afterwards. Dropping the last
//! [`Computed`] handle stops the recomputation; views from
//! [`Computed::read_only`] keep the last value.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::effect::{Effect, EffectOptions, ErrorContext};
use super::signal::{ReadOnlySignal, Signal};
use super::subscriber::{Identifier, Role, SubscriberId};
use crate::error::{BoxError, ReactiveError, Result};

/// Fallback producer: receives the error, where it was raised, and the
/// previous value, if any.
pub type Fallback<T> = Rc<dyn Fn(&ReactiveError, &ErrorContext, Option<T>) -> T>;

/// Options recognised when creating a computed value.
///
/// | option       | default                                  |
/// |--------------|------------------------------------------|
/// | `identifier` | generated from the role and an ID        |
/// | `on_error`   | none: errors take the effect error path  |
pub struct ComputedOptions<T> {
    identifier: Option<Identifier>,
    on_error: Option<Fallback<T>>,
}

impl<T> Default for ComputedOptions<T> {
    fn default() -> Self {
        Self {
            identifier: None,
            on_error: None,
        }
    }
}

impl<T> ComputedOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Recover from a failing evaluation. The returned value becomes the
    /// computed value and the error goes no further. The context always
    /// reports [`ErrorContext::from_computed`].
    pub fn on_error(
        mut self,
        fallback: impl Fn(&ReactiveError, &ErrorContext, Option<T>) -> T + 'static,
    ) -> Self {
        self.on_error = Some(Rc::new(fallback));
        self
    }
}

/// A derived value that recomputes when its dependencies change.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Computed, Signal};
///
/// let count = Signal::new(2);
/// let doubled = Computed::new({
///     let count = count.clone();
///     move || count.get() * 2
/// })
/// .unwrap();
///
/// assert_eq!(doubled.get(), 4);
///
/// count.set(5).unwrap();
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Computed<T: 'static> {
    signal: Signal<T>,
    effect: Effect,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a computed value from an infallible function.
    pub fn new<F>(f: F) -> Result<Self>
    where
        F: Fn() -> T + 'static,
    {
        Self::try_new(move || Ok(f()))
    }

    /// Create a computed value from a fallible function.
    pub fn try_new<F>(f: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, BoxError> + 'static,
    {
        Self::with_options(f, ComputedOptions::default())
    }

    pub fn with_options<F>(f: F, options: ComputedOptions<T>) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, BoxError> + 'static,
    {
        let identifier = options
            .identifier
            .unwrap_or_else(|| Identifier::generate(Role::Computed, SubscriberId::new()));
        let fallback = options.on_error;
        let slot: Rc<RefCell<Option<Signal<T>>>> = Rc::new(RefCell::new(None));

        let body = {
            let slot = Rc::clone(&slot);
            let identifier = identifier.clone();
            move || -> std::result::Result<(), BoxError> {
                let value = match (f(), &fallback) {
                    (Ok(value), _) => value,
                    (Err(error), Some(fallback)) => {
                        let error = ReactiveError::from_body(error, Role::Computed, &identifier);
                        tracing::debug!(identifier = %identifier, %error, "computed value recovered");
                        let context = ErrorContext {
                            identifier: identifier.clone(),
                            role: Role::Computed,
                        };
                        let previous = slot.borrow().as_ref().map(Signal::peek);
                        fallback(&error, &context, previous)
                    }
                    (Err(error), None) => return Err(error),
                };

                let existing = slot.borrow().clone();
                match existing {
                    Some(signal) => signal.set(value)?,
                    None => *slot.borrow_mut() = Some(Signal::new(value)),
                }
                Ok(())
            }
        };

        let effect = Effect::with_options(
            body,
            EffectOptions::new()
                .identifier(identifier)
                .role(Role::Computed),
        )?;

        let signal = slot
            .borrow()
            .clone()
            .expect("first successful run stores the computed value");

        Ok(Self { signal, effect })
    }

    /// Tracked read of the latest value.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Untracked read of the latest value.
    pub fn peek(&self) -> T {
        self.signal.peek()
    }

    pub fn identifier(&self) -> &Identifier {
        self.effect.identifier()
    }

    pub fn read_only(&self) -> ReadOnlySignal<T> {
        self.signal.read_only()
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    /// Number of evaluations so far.
    pub fn run_count(&self) -> usize {
        self.effect.run_count()
    }
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("identifier", self.identifier())
            .field("value", &self.peek())
            .field("run_count", &self.run_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
