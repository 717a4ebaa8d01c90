//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, effects,
//! computed values and async resources.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a computed value or effect), the signal
//! automatically registers that context as a dependent. When the signal's
//! value changes, all dependents are notified before the write returns.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! external systems.
//!
//! ## Computed Values
//!
//! A Computed value is a signal kept current by an internal effect. It is
//! read-only from the outside and only notifies when its result changes.
//!
//! ## Resources
//!
//! A Resource runs an async fetch whenever its reactive parameters change
//! and exposes `{data, loading, error}` as a signal.
//!
//! ## Tracked Signals
//!
//! A [`TrackedSignal`] holds a dynamic [`Value`](crate::value::Value) behind
//! the membrane, so nested writes notify like top-level ones.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, register the dependency.

mod computed;
mod context;
mod effect;
mod resource;
mod runtime;
mod signal;
mod subscriber;
mod tracked;

pub use computed::{Computed, ComputedOptions, Fallback};
pub use context::{untrack, ReactiveContext};
pub use effect::{Effect, EffectOptions, EffectState, ErrorContext, ErrorHandler};
pub use resource::{AsyncState, MutationHandle, OnMutate, Resource, ResourceBuilder};
pub use runtime::Runtime;
pub use signal::{EqualsFn, ReadOnlySignal, Signal, SignalOptions};
pub use subscriber::{Identifier, Observer, ObserverHandle, Role, Source, SubscriberId};
pub use tracked::{ReadOnlyTrackedSignal, TrackedSignal};
