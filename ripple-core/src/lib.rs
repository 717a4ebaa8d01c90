//! Ripple Core
//!
//! This crate provides a fine-grained reactive state runtime. It implements:
//!
//! - Reactive primitives (signals, effects, computed values)
//! - Async resources with parameter-driven refetching and optimistic mutation
//! - A deep mutation membrane that makes nested writes observable
//! - Pluggable storage adapters for signal values
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `membrane`: Reactive and read-only proxies over dynamic values
//! - `value`: The dynamic value model and deep equality
//! - `storage`: Where signal values live
//! - `config`: Per-thread runtime settings
//! - `error`: The crate's error type
//!
//! Everything reactive is single-threaded: one runtime per thread, `Rc`
//! handles, no locking. Async work runs as local tasks on a
//! [`tokio::task::LocalSet`].
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ripple_core::reactive::{Computed, Effect, Signal};
//!
//! // Create a signal
//! let count = Signal::new(0);
//!
//! // Create a derived value
//! let doubled = Computed::new({
//!     let count = count.clone();
//!     move || count.get() * 2
//! })
//! .unwrap();
//!
//! // Create an effect
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let _effect = Effect::new({
//!     let (count, doubled, log) = (count.clone(), doubled.clone(), log.clone());
//!     move || {
//!         log.borrow_mut().push((count.get(), doubled.get()));
//!         Ok(())
//!     }
//! })
//! .unwrap();
//!
//! // Update the signal; the effect runs before `set` returns
//! count.set(5).unwrap();
//! assert_eq!(log.borrow().last(), Some(&(5, 10)));
//! ```

pub mod config;
pub mod error;
pub mod membrane;
pub mod reactive;
pub mod storage;
pub mod value;

pub use config::{OverlapPolicy, RuntimeConfig};
pub use error::{BoxError, ReactiveError, Result};
pub use membrane::{Membrane, MembraneOptions, Proxy, Wrapped};
pub use reactive::{
    untrack, AsyncState, Computed, Effect, Resource, Runtime, Signal, TrackedSignal,
};
pub use value::{is_equal, Value};
