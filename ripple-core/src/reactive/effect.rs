//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect re-runs synchronously, before
//!    the write that changed it returns.
//!
//! 3. Before re-running, the effect drops its old subscriptions and tracks
//!    new ones during execution, so dependencies are rediscovered on every
//!    run.
//!
//! # Re-entrancy
//!
//! A body that writes a signal it also reads re-enters itself. Each nested
//! run increments the effect's stack depth; once the depth reaches
//! [`Runtime::max_stack_depth`] the next entry fails with
//! [`ReactiveError::CircularDependency`] instead of recursing further.
//!
//! # Errors
//!
//! A failing body moves the effect to [`EffectState::Errored`]. With an
//! `on_error` handler the error stops there. Without one it is logged and
//! returned, so it surfaces from the `set` call that triggered the run.
//!
//! # Lifetime
//!
//! Signals hold strong handles to their subscribers, and a body usually
//! holds the signals it reads. Dropping the last [`Effect`] handle disposes
//! the effect, which releases those subscriptions so the effect and
//! everything its body captured can be freed. Keep a handle for as long as
//! the effect should run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::{Identifier, ObserverHandle, Observer, Role, Source, SubscriberId};
use crate::error::{BoxError, ReactiveError, Result};

/// Lifecycle of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Never run.
    Unset,
    /// Body is on the stack.
    Computing,
    /// Last run succeeded.
    Ready,
    /// Last run failed.
    Errored,
}

/// Where an error handler is being called from.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub identifier: Identifier,
    pub role: Role,
}

impl ErrorContext {
    /// Whether the failing effect evaluates a computed value.
    pub fn from_computed(&self) -> bool {
        self.role == Role::Computed
    }
}

/// Handler that takes over errors raised by an effect body.
pub type ErrorHandler = Rc<dyn Fn(&ReactiveError, &ErrorContext)>;

/// Options recognised when creating an effect.
///
/// | option       | default                                |
/// |--------------|----------------------------------------|
/// | `identifier` | generated from the role and ID         |
/// | `on_error`   | log with `tracing::error!` and return  |
/// | `role`       | [`Role::Effect`]                       |
#[derive(Clone, Default)]
pub struct EffectOptions {
    identifier: Option<Identifier>,
    on_error: Option<ErrorHandler>,
    role: Option<Role>,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn on_error(mut self, handler: impl Fn(&ReactiveError, &ErrorContext) + 'static) -> Self {
        self.on_error = Some(Rc::new(handler));
        self
    }

    /// The role reported in diagnostics.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

type Body = Box<dyn Fn() -> std::result::Result<(), BoxError>>;

struct EffectInner {
    subscriber_id: SubscriberId,
    identifier: Identifier,
    role: Role,
    body: Body,
    on_error: Option<ErrorHandler>,
    state: Cell<EffectState>,
    stack_depth: Cell<usize>,
    sources: RefCell<Vec<Weak<dyn Source>>>,
    disposed: Cell<bool>,
    run_count: Cell<usize>,
    last_error: RefCell<Option<ReactiveError>>,
    this: Weak<EffectInner>,
}

impl EffectInner {
    fn run(&self) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }
        let Some(handle) = self.this.upgrade() else {
            return Ok(());
        };

        let depth = self.stack_depth.get();
        if self.state.get() == EffectState::Computing && depth >= Runtime::max_stack_depth() {
            let error = ReactiveError::CircularDependency {
                role: self.role,
                identifier: self.identifier.clone(),
                depth,
            };
            tracing::error!(role = %self.role, identifier = %self.identifier, depth, "circular dependency detected");
            *self.last_error.borrow_mut() = Some(error.clone());
            return Err(error);
        }

        self.clear_sources();
        self.state.set(EffectState::Computing);
        self.stack_depth.set(depth + 1);
        self.run_count.set(self.run_count.get() + 1);

        tracing::trace!(
            role = %self.role,
            identifier = %self.identifier,
            depth = depth + 1,
            "running effect"
        );

        let outcome = {
            let handle: ObserverHandle = handle;
            let _ctx = ReactiveContext::enter(handle);
            (self.body)()
        };

        self.stack_depth.set(depth);
        let settled = |state| if depth > 0 { EffectState::Computing } else { state };

        match outcome {
            Ok(()) => {
                self.state.set(settled(EffectState::Ready));
                Ok(())
            }
            Err(error) => {
                let error = ReactiveError::from_body(error, self.role, &self.identifier);
                self.state.set(settled(EffectState::Errored));
                *self.last_error.borrow_mut() = Some(error.clone());
                self.handle_error(error)
            }
        }
    }

    fn handle_error(&self, error: ReactiveError) -> Result<()> {
        match &self.on_error {
            Some(handler) => {
                let context = ErrorContext {
                    identifier: self.identifier.clone(),
                    role: self.role,
                };
                handler(&error, &context);
                Ok(())
            }
            None => {
                tracing::error!(role = %self.role, identifier = %self.identifier, %error, "unhandled error");
                Err(error)
            }
        }
    }

    fn dispose(&self) {
        self.disposed.set(true);
        self.clear_sources();
    }

    /// Leave every subscriber set joined during the previous run.
    fn clear_sources(&self) {
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            if let Some(source) = source.upgrade() {
                source.unsubscribe(self.subscriber_id);
            }
        }
    }
}

impl Observer for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn notify(&self) -> Result<()> {
        self.run()
    }

    fn depends_on(&self, source: Weak<dyn Source>) {
        self.sources.borrow_mut().push(source);
    }
}

/// Disposes its effect when the last [`Effect`] handle goes away.
struct Owner(Weak<EffectInner>);

impl Drop for Owner {
    fn drop(&mut self) {
        if let Some(inner) = self.0.upgrade() {
            tracing::trace!(identifier = %inner.identifier, "last handle dropped");
            inner.dispose();
        }
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ripple_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let seen = Rc::new(Cell::new(0));
///
/// let _effect = Effect::new({
///     let count = count.clone();
///     let seen = seen.clone();
///     move || {
///         seen.set(count.get());
///         Ok(())
///     }
/// })
/// .unwrap();
///
/// count.set(5).unwrap();
/// assert_eq!(seen.get(), 5);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
    _owner: Rc<Owner>,
}

impl Effect {
    /// Create a new effect and run it once.
    ///
    /// An error from that first run is returned here and the effect is
    /// dropped with it.
    pub fn new<F>(body: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<(), BoxError> + 'static,
    {
        Self::with_options(body, EffectOptions::default())
    }

    /// Create a new effect with explicit options and run it once.
    pub fn with_options<F>(body: F, options: EffectOptions) -> Result<Self>
    where
        F: Fn() -> std::result::Result<(), BoxError> + 'static,
    {
        let subscriber_id = SubscriberId::new();
        let role = options.role.unwrap_or(Role::Effect);
        let identifier = options
            .identifier
            .unwrap_or_else(|| Identifier::generate(role, subscriber_id));

        let inner = Rc::new_cyclic(|this| EffectInner {
            subscriber_id,
            identifier,
            role,
            body: Box::new(body),
            on_error: options.on_error,
            state: Cell::new(EffectState::Unset),
            stack_depth: Cell::new(0),
            sources: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
            last_error: RefCell::new(None),
            this: this.clone(),
        });

        let owner = Rc::new(Owner(Rc::downgrade(&inner)));
        let effect = Self {
            inner,
            _owner: owner,
        };
        if let Err(error) = effect.execute() {
            effect.dispose();
            return Err(error);
        }
        Ok(effect)
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.subscriber_id.raw()
    }

    /// Get the subscriber ID used in signal subscriber sets.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    pub fn identifier(&self) -> &Identifier {
        &self.inner.identifier
    }

    /// Run the body again, re-tracking its dependencies.
    pub fn execute(&self) -> Result<()> {
        self.inner.run()
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect will not run again and holds no
    /// subscriptions.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn state(&self) -> EffectState {
        self.inner.state.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of sources read during the latest run that are still
    /// alive.
    pub fn dependency_count(&self) -> usize {
        self.inner
            .sources
            .borrow()
            .iter()
            .filter(|source| source.strong_count() > 0)
            .count()
    }

    /// The error raised by the most recent failing run, if any.
    pub fn last_error(&self) -> Option<ReactiveError> {
        self.inner.last_error.borrow().clone()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("identifier", &self.inner.identifier)
            .field("state", &self.state())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
