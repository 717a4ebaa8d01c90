//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! The runtime keeps a stack of frames. When an effect runs, its handle is
//! pushed; when it completes, it is popped. The guard returned by
//! [`ReactiveContext::enter`] does the popping in `Drop`, so the stack stays
//! balanced on every exit path, including errors and panics.
//!
//! This design supports nested reactive contexts (e.g., a computed value that
//! reads from another computed value while an effect is running).

use super::runtime::{Frame, Runtime};
use super::subscriber::{ObserverHandle, SubscriberId};

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given observer.
    ///
    /// While this context is active, any signals that are read will
    /// register the observer as a dependent.
    pub fn enter(observer: ObserverHandle) -> Self {
        let subscriber_id = Some(observer.subscriber_id());
        Runtime::with(|rt| {
            rt.push(Frame {
                observer: Some(observer),
            })
        });
        Self { subscriber_id }
    }

    /// Enter an untracked region. Reads inside it subscribe nothing.
    pub fn untracked() -> Self {
        Runtime::with(|rt| rt.push(Frame { observer: None }));
        Self {
            subscriber_id: None,
        }
    }

    /// Check if there is an observer that reads would be attributed to.
    pub fn is_active() -> bool {
        Runtime::with(|rt| rt.current_observer().is_some())
    }

    /// Get the current observer, if any.
    pub fn current_observer() -> Option<ObserverHandle> {
        Runtime::with(|rt| rt.current_observer())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        Runtime::with(|rt| rt.current_subscriber())
    }

    /// Number of frames currently on the stack.
    pub fn depth() -> usize {
        Runtime::with(|rt| rt.depth())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = Runtime::with(|rt| rt.pop());

        // Verify we're popping the right context.
        if let Some(frame) = popped {
            debug_assert_eq!(
                frame.observer.as_ref().map(|o| o.subscriber_id()),
                self.subscriber_id,
                "ReactiveContext mismatch"
            );
        }
    }
}

/// Run `f` without attributing its reads to the current observer.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::reactive::subscriber::{Observer, Source};
    use std::rc::{Rc, Weak};

    struct NoopObserver {
        id: SubscriberId,
    }

    impl Observer for NoopObserver {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn notify(&self) -> Result<()> {
            Ok(())
        }

        fn depends_on(&self, _source: Weak<dyn Source>) {}
    }

    fn observer() -> ObserverHandle {
        Rc::new(NoopObserver {
            id: SubscriberId::new(),
        })
    }

    #[test]
    fn context_tracks_subscriber() {
        let handle = observer();
        let id = handle.subscriber_id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(handle);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let outer = observer();
        let inner = observer();
        let (id1, id2) = (outer.subscriber_id(), inner.subscriber_id());

        {
            let _ctx1 = ReactiveContext::enter(outer);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(inner);
                assert_eq!(ReactiveContext::current_subscriber(), Some(id2));
                assert_eq!(ReactiveContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untracked_region_hides_outer_observer() {
        let _ctx = ReactiveContext::enter(observer());
        assert!(ReactiveContext::is_active());

        let inside = untrack(ReactiveContext::is_active);
        assert!(!inside);
        assert!(ReactiveContext::is_active());
    }
}
