//! Async Resources
//!
//! A [`Resource`] keeps the result of an async fetch in a signal of
//! [`AsyncState`] and fetches again whenever its parameters change.
//!
//! # Lifecycle
//!
//! ```text
//!   {data: None, loading: true}  ──fetch ok──▶  {data: Some(v), loading: false}
//!              │                                          │
//!              └──fetch err──▶ {data: None, error: Some(e)}
//!                                                         │
//!   params change / refetch ──▶ {data: Some(v), loading: true} (stale data kept)
//! ```
//!
//! An internal effect reads the parameter function and the `fetch_when`
//! predicate, so both are tracked. When the predicate is false the last
//! known value is republished without a loading transition. When the
//! parameters equal the ones used by the previous fetch nothing happens,
//! unless [`Resource::refetch`] forced the run.
//!
//! # Overlapping fetches
//!
//! With [`OverlapPolicy::LastWriteWins`] a fetch superseded by a newer one
//! is not cancelled, and whichever completes last decides the state. Use
//! [`OverlapPolicy::CancelSuperseded`] to abort the older task instead.
//!
//! Fetches are spawned with [`tokio::task::spawn_local`], so resources must
//! be created and refetched inside a [`tokio::task::LocalSet`]. Outside one,
//! building or refetching fails with
//! [`ReactiveError::NoLocalRuntime`](crate::error::ReactiveError::NoLocalRuntime).
//!
//! # Lifetime
//!
//! Dropping the last [`Resource`] handle stops tracking the parameters and
//! aborts the fetch in flight.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinHandle;

use super::context::{untrack, ReactiveContext};
use super::effect::{Effect, EffectOptions};
use super::runtime::Runtime;
use super::signal::{ReadOnlySignal, Signal};
use super::subscriber::{Identifier, Role, SubscriberId};
use crate::config::OverlapPolicy;
use crate::error::{BoxError, Result};

/// Snapshot of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T, E> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<E>,
}

impl<T, E> AsyncState<T, E> {
    fn loading(data: Option<T>) -> Self {
        Self {
            data,
            loading: true,
            error: None,
        }
    }

    fn ready(data: Option<T>) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    fn failed(error: E) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error),
        }
    }
}

type FetchFuture<T, E> = LocalBoxFuture<'static, std::result::Result<T, E>>;
type Fetcher<T, P, E> = Rc<dyn Fn(P) -> FetchFuture<T, E>>;

/// Reconciliation hook: `(new_value, previous_value, handle)`.
pub type OnMutate<T, E> = Rc<dyn Fn(T, Option<T>, MutationHandle<T, E>)>;

/// Failed-fetch hook: `(error, last_value)` to the state to publish.
pub type OnFetchError<T, E> = Rc<dyn Fn(&E, Option<T>) -> AsyncState<T, E>>;

struct ResourceShared<T: 'static, P, E: 'static> {
    identifier: Identifier,
    state: Signal<AsyncState<T, E>>,
    fetcher: Fetcher<T, P, E>,
    params: Option<Rc<dyn Fn() -> P>>,
    fetch_when: Option<Rc<dyn Fn() -> bool>>,
    optimistic_mutate: bool,
    on_mutate: Option<OnMutate<T, E>>,
    on_error: Option<OnFetchError<T, E>>,
    overlap_policy: OverlapPolicy,
    last_value: RefCell<Option<T>>,
    last_params: RefCell<Option<P>>,
    force: Cell<bool>,
    in_flight: RefCell<Option<JoinHandle<()>>>,
    this: Weak<Self>,
}

impl<T, P, E> ResourceShared<T, P, E>
where
    T: Clone + PartialEq + 'static,
    P: Clone + PartialEq + Default + 'static,
    E: Clone + PartialEq + 'static,
{
    /// Body of the internal effect.
    fn evaluate(&self) -> Result<()> {
        let params = match &self.params {
            Some(params) => params(),
            None => P::default(),
        };
        let should_fetch = self.fetch_when.as_ref().map_or(true, |fetch_when| fetch_when());

        if !should_fetch {
            tracing::trace!(identifier = %self.identifier, "fetch skipped");
            let last = self.last_value.borrow().clone();
            return self.state.set(AsyncState::ready(last));
        }

        let forced = self.force.replace(false);
        let unchanged = self.last_params.borrow().as_ref() == Some(&params);
        if unchanged && !forced {
            return Ok(());
        }

        self.spawn_fetch(params.clone(), forced)?;
        *self.last_params.borrow_mut() = Some(params);
        let last = self.last_value.borrow().clone();
        self.state.set(AsyncState::loading(last))
    }

    fn spawn_fetch(&self, params: P, forced: bool) -> Result<()> {
        tracing::debug!(identifier = %self.identifier, forced, "fetching");

        let future = untrack(|| (self.fetcher)(params));
        let weak = self.this.clone();
        let task = Runtime::spawn_local("resource fetch", async move {
            let outcome = future.await;
            if let Some(shared) = weak.upgrade() {
                shared.settle(outcome);
            }
        })?;

        let previous = self.in_flight.borrow_mut().replace(task);
        if let Some(previous) = previous {
            if self.overlap_policy == OverlapPolicy::CancelSuperseded && !previous.is_finished() {
                tracing::debug!(identifier = %self.identifier, "aborting superseded fetch");
                previous.abort();
            }
        }
        Ok(())
    }

    fn settle(&self, outcome: std::result::Result<T, E>) {
        let _ctx = ReactiveContext::untracked();

        let state = match outcome {
            Ok(data) => {
                tracing::debug!(identifier = %self.identifier, "fetch completed");
                *self.last_value.borrow_mut() = Some(data.clone());
                AsyncState::ready(Some(data))
            }
            Err(error) => {
                tracing::debug!(identifier = %self.identifier, "fetch failed");
                match &self.on_error {
                    Some(on_error) => {
                        let last = self.last_value.borrow().clone();
                        let state = on_error(&error, last);
                        *self.last_value.borrow_mut() = state.data.clone();
                        state
                    }
                    None => AsyncState::failed(error),
                }
            }
        };

        if let Err(error) = self.state.set(state) {
            tracing::error!(identifier = %self.identifier, %error, "resource update failed to propagate");
        }
    }

    fn apply(&self, data: Option<T>, error: Option<E>) -> Result<()> {
        *self.last_value.borrow_mut() = data.clone();
        self.state.set(AsyncState {
            data,
            loading: false,
            error,
        })
    }
}

impl<T: 'static, P, E: 'static> Drop for ResourceShared<T, P, E> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.get_mut().take() {
            task.abort();
        }
    }
}

/// Callback handed to an `on_mutate` hook to commit the authoritative
/// result of a mutation.
pub struct MutationHandle<T: 'static, E: 'static> {
    shared: Weak<dyn Apply<T, E>>,
}

/// Object-safe view of a resource that mutation handles can write through
/// without knowing its parameter type.
trait Apply<T, E> {
    fn apply(&self, data: Option<T>, error: Option<E>) -> Result<()>;
}

impl<T, P, E> Apply<T, E> for ResourceShared<T, P, E>
where
    T: Clone + PartialEq + 'static,
    P: Clone + PartialEq + Default + 'static,
    E: Clone + PartialEq + 'static,
{
    fn apply(&self, data: Option<T>, error: Option<E>) -> Result<()> {
        ResourceShared::apply(self, data, error)
    }
}

impl<T: 'static, E: 'static> MutationHandle<T, E> {
    /// Store `data` and `error` as the resource's settled state. Does
    /// nothing once the resource is gone.
    pub fn apply(&self, data: Option<T>, error: Option<E>) -> Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.apply(data, error),
            None => Ok(()),
        }
    }
}

impl<T: 'static, E: 'static> Clone for MutationHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for MutationHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationHandle")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Builder for [`Resource`].
///
/// | option              | default                                   |
/// |---------------------|-------------------------------------------|
/// | `params`            | `P::default()`                            |
/// | `initial_value`     | `None`                                    |
/// | `fetch_when`        | always fetch                              |
/// | `optimistic_mutate` | `true`                                    |
/// | `on_mutate`         | none                                      |
/// | `on_error`          | store the error, clear the data           |
/// | `overlap_policy`    | the thread's [`RuntimeConfig`](crate::config::RuntimeConfig) |
/// | `identifier`        | generated                                 |
pub struct ResourceBuilder<T: 'static, P, E: 'static> {
    fetcher: Fetcher<T, P, E>,
    params: Option<Rc<dyn Fn() -> P>>,
    initial_value: Option<T>,
    fetch_when: Option<Rc<dyn Fn() -> bool>>,
    optimistic_mutate: bool,
    on_mutate: Option<OnMutate<T, E>>,
    on_error: Option<OnFetchError<T, E>>,
    overlap_policy: Option<OverlapPolicy>,
    identifier: Option<Identifier>,
}

impl<T, P, E> ResourceBuilder<T, P, E>
where
    T: Clone + PartialEq + 'static,
    P: Clone + PartialEq + Default + 'static,
    E: Clone + PartialEq + 'static,
{
    /// Derive the fetch parameters. Signals read here are tracked.
    pub fn params(mut self, params: impl Fn() -> P + 'static) -> Self {
        self.params = Some(Rc::new(params));
        self
    }

    pub fn initial_value(mut self, value: T) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Gate fetching. Signals read here are tracked.
    pub fn fetch_when(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.fetch_when = Some(Rc::new(predicate));
        self
    }

    pub fn optimistic_mutate(mut self, optimistic: bool) -> Self {
        self.optimistic_mutate = optimistic;
        self
    }

    pub fn on_mutate(
        mut self,
        hook: impl Fn(T, Option<T>, MutationHandle<T, E>) + 'static,
    ) -> Self {
        self.on_mutate = Some(Rc::new(hook));
        self
    }

    /// Decide the state published after a failed fetch. Receives the error
    /// and the last successfully fetched value.
    pub fn on_error(
        mut self,
        hook: impl Fn(&E, Option<T>) -> AsyncState<T, E> + 'static,
    ) -> Self {
        self.on_error = Some(Rc::new(hook));
        self
    }

    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = Some(policy);
        self
    }

    pub fn identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Create the resource and start the first fetch.
    pub fn build(self) -> Result<Resource<T, P, E>> {
        let identifier = self
            .identifier
            .unwrap_or_else(|| Identifier::generate(Role::Resource, SubscriberId::new()));
        let overlap_policy = self
            .overlap_policy
            .unwrap_or_else(|| Runtime::config().overlap_policy);

        let shared = Rc::new_cyclic(|this| ResourceShared {
            identifier: identifier.clone(),
            state: Signal::new(AsyncState::loading(self.initial_value.clone())),
            fetcher: self.fetcher,
            params: self.params,
            fetch_when: self.fetch_when,
            optimistic_mutate: self.optimistic_mutate,
            on_mutate: self.on_mutate,
            on_error: self.on_error,
            overlap_policy,
            last_value: RefCell::new(self.initial_value),
            last_params: RefCell::new(None),
            force: Cell::new(false),
            in_flight: RefCell::new(None),
            this: this.clone(),
        });

        let effect = Effect::with_options(
            {
                let shared = Rc::clone(&shared);
                move || -> std::result::Result<(), BoxError> { Ok(shared.evaluate()?) }
            },
            EffectOptions::new()
                .identifier(identifier)
                .role(Role::Resource),
        )?;

        Ok(Resource { shared, effect })
    }
}

/// Async data with reactive parameters.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Resource, Signal};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// tokio::task::LocalSet::new()
///     .run_until(async {
///         let user_id = Signal::new(1u32);
///         let user = Resource::builder(|id: u32| async move { Ok::<_, String>(format!("user {id}")) })
///             .params({
///                 let user_id = user_id.clone();
///                 move || user_id.get()
///             })
///             .build()
///             .unwrap();
///
///         assert!(user.peek().loading);
///         tokio::task::yield_now().await;
///         assert_eq!(user.peek().data.as_deref(), Some("user 1"));
///     })
///     .await;
/// # });
/// ```
pub struct Resource<T: 'static, P: 'static, E: 'static> {
    shared: Rc<ResourceShared<T, P, E>>,
    effect: Effect,
}

impl<T, P, E> Resource<T, P, E>
where
    T: Clone + PartialEq + 'static,
    P: Clone + PartialEq + Default + 'static,
    E: Clone + PartialEq + 'static,
{
    /// Start building a resource around `fetch`.
    pub fn builder<F, Fut>(fetch: F) -> ResourceBuilder<T, P, E>
    where
        F: Fn(P) -> Fut + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + 'static,
    {
        ResourceBuilder {
            fetcher: Rc::new(move |params| fetch(params).boxed_local()),
            params: None,
            initial_value: None,
            fetch_when: None,
            optimistic_mutate: true,
            on_mutate: None,
            on_error: None,
            overlap_policy: None,
            identifier: None,
        }
    }

    /// The state as a read-only signal.
    pub fn data(&self) -> ReadOnlySignal<AsyncState<T, E>> {
        self.shared.state.read_only()
    }

    /// Tracked read of the current state.
    pub fn get(&self) -> AsyncState<T, E> {
        self.shared.state.get()
    }

    /// Untracked read of the current state.
    pub fn peek(&self) -> AsyncState<T, E> {
        self.shared.state.peek()
    }

    pub fn identifier(&self) -> &Identifier {
        &self.shared.identifier
    }

    /// Fetch again even if the parameters have not changed.
    pub fn refetch(&self) -> Result<()> {
        self.shared.force.set(true);
        self.effect.execute()
    }

    /// Replace the data locally.
    ///
    /// With optimistic mutation (the default) the value is published right
    /// away. The `on_mutate` hook, if any, then receives the new and the
    /// previous value along with a [`MutationHandle`] for committing the
    /// authoritative result.
    pub fn mutate(&self, value: T) -> Result<()> {
        let shared = &self.shared;
        let previous = shared.state.peek().data;

        if shared.optimistic_mutate {
            shared.apply(Some(value.clone()), None)?;
        }

        if let Some(on_mutate) = &shared.on_mutate {
            let weak: Weak<ResourceShared<T, P, E>> = Rc::downgrade(shared);
            let handle = MutationHandle {
                shared: weak as Weak<dyn Apply<T, E>>,
            };
            on_mutate(value, previous, handle);
        }
        Ok(())
    }

    /// Stop reacting to parameter changes and abort any fetch in flight.
    pub fn dispose(&self) {
        self.effect.dispose();
        if let Some(task) = self.shared.in_flight.borrow_mut().take() {
            task.abort();
        }
    }
}

impl<T: 'static, P: 'static, E: 'static> Clone for Resource<T, P, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            effect: self.effect.clone(),
        }
    }
}

impl<T, P, E> fmt::Debug for Resource<T, P, E>
where
    T: Clone + fmt::Debug + 'static,
    P: 'static,
    E: Clone + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("identifier", &self.shared.identifier)
            .field("state", &self.shared.state.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::error::ReactiveError;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    type State = AsyncState<String, String>;

    fn state(data: Option<&str>, loading: bool, error: Option<&str>) -> State {
        AsyncState {
            data: data.map(str::to_owned),
            loading,
            error: error.map(str::to_owned),
        }
    }

    /// Let spawned fetches run to completion.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    /// Fetcher whose calls complete only when the test says so.
    #[derive(Clone, Default)]
    struct Pending {
        senders: Rc<RefCell<VecDeque<oneshot::Sender<std::result::Result<String, String>>>>>,
        calls: Rc<Cell<usize>>,
    }

    impl Pending {
        fn fetch(&self) -> impl Fn(u32) -> LocalBoxFuture<'static, std::result::Result<String, String>> {
            let this = self.clone();
            move |_params| {
                this.calls.set(this.calls.get() + 1);
                let (tx, rx) = oneshot::channel();
                this.senders.borrow_mut().push_back(tx);
                async move { rx.await.unwrap_or_else(|_| Err("dropped".to_owned())) }.boxed_local()
            }
        }

        fn complete_oldest(&self, result: std::result::Result<&str, &str>) {
            let sender = self.senders.borrow_mut().pop_front().unwrap();
            let _ = sender.send(result.map(str::to_owned).map_err(str::to_owned));
        }

        fn complete_newest(&self, result: std::result::Result<&str, &str>) {
            let sender = self.senders.borrow_mut().pop_back().unwrap();
            let _ = sender.send(result.map(str::to_owned).map_err(str::to_owned));
        }
    }

    #[tokio::test]
    async fn loads_then_settles() {
        LocalSet::new()
            .run_until(async {
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .build()
                    .unwrap();

                assert_eq!(resource.peek(), state(None, true, None));
                settle().await;
                assert_eq!(resource.peek(), state(Some("done"), false, None));
            })
            .await;
    }

    #[tokio::test]
    async fn failed_fetch_is_stored_not_raised() {
        LocalSet::new()
            .run_until(async {
                let resource =
                    Resource::builder(|_: ()| async { Err::<String, _>("offline".to_owned()) })
                        .initial_value("cached".to_owned())
                        .build()
                        .unwrap();

                assert_eq!(resource.peek(), state(Some("cached"), true, None));
                settle().await;
                assert_eq!(resource.peek(), state(None, false, Some("offline")));
            })
            .await;
    }

    #[tokio::test]
    async fn on_error_replaces_the_failed_state() {
        LocalSet::new()
            .run_until(async {
                let pending = Pending::default();
                let resource = Resource::builder(pending.fetch())
                    .on_error(|error: &String, last: Option<String>| AsyncState {
                        data: last,
                        loading: false,
                        error: Some(format!("retrying after {error}")),
                    })
                    .build()
                    .unwrap();

                pending.complete_oldest(Ok("v1"));
                settle().await;

                resource.refetch().unwrap();
                pending.complete_oldest(Err("timeout"));
                settle().await;

                assert_eq!(
                    resource.peek(),
                    state(Some("v1"), false, Some("retrying after timeout"))
                );
            })
            .await;
    }

    #[test]
    fn building_without_local_set_is_an_error() {
        let error = Resource::builder(|_: ()| async { Ok::<_, String>(1) })
            .build()
            .unwrap_err();
        assert!(matches!(error, ReactiveError::NoLocalRuntime { .. }));
    }

    #[tokio::test]
    async fn building_on_runtime_without_local_set_is_an_error() {
        let error = Resource::builder(|_: ()| async { Ok::<_, String>(1) })
            .build()
            .unwrap_err();
        assert!(matches!(error, ReactiveError::NoLocalRuntime { .. }));
    }

    #[tokio::test]
    async fn dropping_resource_releases_params_and_aborts_fetch() {
        LocalSet::new()
            .run_until(async {
                let pending = Pending::default();
                let id = Signal::new(1u32);
                let resource = Resource::builder(pending.fetch())
                    .params({
                        let id = id.clone();
                        move || id.get()
                    })
                    .build()
                    .unwrap();
                assert_eq!(id.subscriber_count(), 1);

                drop(resource);
                settle().await;

                assert_eq!(id.subscriber_count(), 0);
                assert!(pending.senders.borrow()[0].is_closed());
                id.set(2).unwrap();
                assert_eq!(pending.calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn refetch_keeps_stale_data_while_loading() {
        LocalSet::new()
            .run_until(async {
                let pending = Pending::default();
                let resource = Resource::builder(pending.fetch()).build().unwrap();

                pending.complete_oldest(Ok("done"));
                settle().await;
                assert_eq!(resource.peek(), state(Some("done"), false, None));

                resource.refetch().unwrap();
                assert_eq!(resource.peek(), state(Some("done"), true, None));

                pending.complete_oldest(Ok("again"));
                settle().await;
                assert_eq!(resource.peek(), state(Some("again"), false, None));
                assert_eq!(pending.calls.get(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn parameter_changes_trigger_fetches() {
        LocalSet::new()
            .run_until(async {
                let id = Signal::new(1u32);
                let resource = Resource::builder(|id: u32| async move { Ok::<_, String>(format!("item {id}")) })
                    .params({
                        let id = id.clone();
                        move || id.get()
                    })
                    .build()
                    .unwrap();

                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("item 1"));

                id.set(2).unwrap();
                assert_eq!(resource.peek(), state(Some("item 1"), true, None));
                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("item 2"));
            })
            .await;
    }

    #[tokio::test]
    async fn equal_parameters_do_not_refetch() {
        LocalSet::new()
            .run_until(async {
                let pending = Pending::default();
                let page = Signal::new(3u32);
                let _resource = Resource::builder(pending.fetch())
                    .params({
                        let page = page.clone();
                        move || page.get() / 2
                    })
                    .build()
                    .unwrap();
                assert_eq!(pending.calls.get(), 1);

                page.set(2).unwrap();
                assert_eq!(pending.calls.get(), 1);

                page.set(4).unwrap();
                assert_eq!(pending.calls.get(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn fetch_when_gates_fetching() {
        LocalSet::new()
            .run_until(async {
                let enabled = Signal::new(false);
                let calls = Rc::new(Cell::new(0));
                let resource = Resource::builder({
                    let calls = calls.clone();
                    move |_: ()| {
                        calls.set(calls.get() + 1);
                        async { Ok::<_, String>("changed".to_owned()) }
                    }
                })
                .initial_value("initial".to_owned())
                .fetch_when({
                    let enabled = enabled.clone();
                    move || enabled.get()
                })
                .build()
                .unwrap();

                assert_eq!(resource.peek(), state(Some("initial"), false, None));
                settle().await;
                assert_eq!(resource.peek(), state(Some("initial"), false, None));
                assert_eq!(calls.get(), 0);

                enabled.set(true).unwrap();
                assert_eq!(resource.peek(), state(Some("initial"), true, None));
                settle().await;
                assert_eq!(resource.peek(), state(Some("changed"), false, None));
            })
            .await;
    }

    #[tokio::test]
    async fn optimistic_mutation_applies_immediately() {
        LocalSet::new()
            .run_until(async {
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .build()
                    .unwrap();
                settle().await;

                resource.mutate("mutated".to_owned()).unwrap();
                assert_eq!(resource.peek(), state(Some("mutated"), false, None));
            })
            .await;
    }

    #[tokio::test]
    async fn pessimistic_mutation_without_hook_changes_nothing() {
        LocalSet::new()
            .run_until(async {
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .optimistic_mutate(false)
                    .build()
                    .unwrap();
                settle().await;

                resource.mutate("mutated".to_owned()).unwrap();
                assert_eq!(resource.peek(), state(Some("done"), false, None));
            })
            .await;
    }

    #[tokio::test]
    async fn on_mutate_reconciles_asynchronously() {
        LocalSet::new()
            .run_until(async {
                let seen = Rc::new(RefCell::new(None));
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .on_mutate({
                        let seen = seen.clone();
                        move |new: String, previous, handle: MutationHandle<String, String>| {
                            *seen.borrow_mut() = Some((new.clone(), previous));
                            tokio::task::spawn_local(async move {
                                handle
                                    .apply(Some(format!("{new} - post async success")), None)
                                    .unwrap();
                            });
                        }
                    })
                    .build()
                    .unwrap();
                settle().await;

                resource.mutate("mutated".to_owned()).unwrap();
                assert_eq!(resource.peek(), state(Some("mutated"), false, None));
                assert_eq!(
                    *seen.borrow(),
                    Some(("mutated".to_owned(), Some("done".to_owned())))
                );

                settle().await;
                assert_eq!(
                    resource.peek(),
                    state(Some("mutated - post async success"), false, None)
                );
            })
            .await;
    }

    #[tokio::test]
    async fn on_mutate_can_report_errors() {
        LocalSet::new()
            .run_until(async {
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .on_mutate(|_, _, handle| {
                        handle.apply(None, Some("An error occurred".to_owned())).unwrap();
                    })
                    .build()
                    .unwrap();
                settle().await;

                resource.mutate("mutated".to_owned()).unwrap();
                assert_eq!(resource.peek(), state(None, false, Some("An error occurred")));
            })
            .await;
    }

    #[tokio::test]
    async fn superseded_fetch_wins_when_it_lands_last() {
        LocalSet::new()
            .run_until(async {
                let pending = Pending::default();
                let id = Signal::new(1u32);
                let resource = Resource::builder(pending.fetch())
                    .params({
                        let id = id.clone();
                        move || id.get()
                    })
                    .overlap_policy(OverlapPolicy::LastWriteWins)
                    .build()
                    .unwrap();

                id.set(2).unwrap();
                pending.complete_newest(Ok("second"));
                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("second"));

                pending.complete_oldest(Ok("first"));
                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("first"));
            })
            .await;
    }

    #[tokio::test]
    async fn cancel_superseded_aborts_older_fetch() {
        LocalSet::new()
            .run_until(async {
                Runtime::configure(
                    RuntimeConfig::default().with_overlap_policy(OverlapPolicy::CancelSuperseded),
                );

                let pending = Pending::default();
                let id = Signal::new(1u32);
                let resource = Resource::builder(pending.fetch())
                    .params({
                        let id = id.clone();
                        move || id.get()
                    })
                    .build()
                    .unwrap();

                id.set(2).unwrap();
                pending.complete_newest(Ok("second"));
                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("second"));

                pending.complete_oldest(Ok("first"));
                settle().await;
                assert_eq!(resource.peek().data.as_deref(), Some("second"));

                Runtime::configure(RuntimeConfig::default());
            })
            .await;
    }

    #[tokio::test]
    async fn dependents_see_every_transition() {
        LocalSet::new()
            .run_until(async {
                let resource = Resource::builder(|_: ()| async { Ok::<_, String>("done".to_owned()) })
                    .identifier("greeting")
                    .build()
                    .unwrap();
                assert_eq!(resource.identifier().as_str(), "greeting");

                let history = Rc::new(RefCell::new(Vec::new()));
                let _effect = Effect::new({
                    let data = resource.data();
                    let history = history.clone();
                    move || {
                        history.borrow_mut().push(data.get().loading);
                        Ok(())
                    }
                })
                .unwrap();

                settle().await;
                resource.refetch().unwrap();
                settle().await;

                assert_eq!(*history.borrow(), vec![true, false, true, false]);
            })
            .await;
    }
}
