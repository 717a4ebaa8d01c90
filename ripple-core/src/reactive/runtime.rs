//! Reactive Runtime
//!
//! The runtime owns the per-thread state every reactive primitive shares:
//! the observer stack and the active [`RuntimeConfig`].
//!
//! # How It Works
//!
//! 1. When an effect runs, it pushes its handle onto the observer stack.
//!
//! 2. When a signal is read, it asks the runtime for the top of the stack
//!    and, if there is an observer, subscribes it.
//!
//! 3. When the effect finishes (successfully or not) its frame is popped.
//!
//! # Thread Safety
//!
//! There is one runtime per thread, stored in thread-local storage. Signals
//! and effects are `!Send`, so a reactive graph never crosses threads; code
//! that needs to talk across threads does so through the storage adapters.

use std::cell::RefCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use smallvec::SmallVec;
use tokio::task::JoinHandle;

use super::subscriber::{ObserverHandle, SubscriberId};
use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, Result};

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// One frame on the observer stack.
///
/// A frame without an observer is an untracked region: reads inside it do
/// not subscribe anything even when an effect further down is running.
#[derive(Clone)]
pub(crate) struct Frame {
    pub(crate) observer: Option<ObserverHandle>,
}

/// The per-thread reactive runtime.
pub struct Runtime {
    observer_stack: RefCell<SmallVec<[Frame; 8]>>,
    config: RefCell<RuntimeConfig>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            observer_stack: RefCell::new(SmallVec::new()),
            config: RefCell::new(RuntimeConfig::default()),
        }
    }

    /// Run `f` with this thread's runtime.
    pub(crate) fn with<R>(f: impl FnOnce(&Runtime) -> R) -> R {
        RUNTIME.with(f)
    }

    /// Install a configuration for the current thread.
    pub fn configure(config: RuntimeConfig) {
        Self::with(|rt| *rt.config.borrow_mut() = config);
    }

    /// The configuration active on the current thread.
    pub fn config() -> RuntimeConfig {
        Self::with(|rt| rt.config.borrow().clone())
    }

    /// Re-entrancy bound for effects on the current thread.
    pub fn max_stack_depth() -> usize {
        Self::with(|rt| rt.config.borrow().max_stack_depth)
    }

    /// Spawn `future` on the current [`tokio::task::LocalSet`].
    ///
    /// Fails with [`ReactiveError::NoLocalRuntime`] instead of panicking when
    /// there is no tokio runtime, or no `LocalSet` inside it.
    pub(crate) fn spawn_local<F>(operation: &'static str, future: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ReactiveError::NoLocalRuntime { operation });
        }
        // spawn_local panics outside a LocalSet, before the task is registered.
        panic::catch_unwind(AssertUnwindSafe(|| tokio::task::spawn_local(future)))
            .map_err(|_| ReactiveError::NoLocalRuntime { operation })
    }

    pub(crate) fn push(&self, frame: Frame) {
        self.observer_stack.borrow_mut().push(frame);
    }

    pub(crate) fn pop(&self) -> Option<Frame> {
        self.observer_stack.borrow_mut().pop()
    }

    /// The observer on top of the stack, if the top frame is tracked.
    pub(crate) fn current_observer(&self) -> Option<ObserverHandle> {
        self.observer_stack
            .borrow()
            .last()
            .and_then(|frame| frame.observer.clone())
    }

    pub(crate) fn current_subscriber(&self) -> Option<SubscriberId> {
        self.observer_stack
            .borrow()
            .last()
            .and_then(|frame| frame.observer.as_ref().map(|o| o.subscriber_id()))
    }

    pub(crate) fn depth(&self) -> usize {
        self.observer_stack.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlapPolicy;

    #[test]
    fn runtime_starts_with_default_config() {
        assert_eq!(Runtime::config(), RuntimeConfig::default());
    }

    #[test]
    fn configure_replaces_thread_config() {
        Runtime::configure(
            RuntimeConfig::default()
                .with_max_stack_depth(3)
                .with_overlap_policy(OverlapPolicy::CancelSuperseded),
        );

        assert_eq!(Runtime::max_stack_depth(), 3);
        assert_eq!(Runtime::config().overlap_policy, OverlapPolicy::CancelSuperseded);

        Runtime::configure(RuntimeConfig::default());
    }

    #[test]
    fn configuration_is_per_thread() {
        Runtime::configure(RuntimeConfig::default().with_max_stack_depth(2));

        let other = std::thread::spawn(Runtime::max_stack_depth).join().unwrap();
        assert_eq!(other, crate::config::DEFAULT_MAX_STACK_DEPTH);
        assert_eq!(Runtime::max_stack_depth(), 2);

        Runtime::configure(RuntimeConfig::default());
    }
}
