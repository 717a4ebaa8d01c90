//! Deep Mutation Membrane
//!
//! The membrane wraps arrays and plain objects in proxies whose reads
//! re-wrap every nested array or object they return, so an entire reachable
//! graph is instrumented from a single root. Writes through a reactive proxy
//! apply to the original and are reported to the `value_mutated` hook;
//! writes through a read-only proxy fail.
//!
//! # Identity
//!
//! Wrapping is idempotent: asking twice for the proxy of the same node in
//! the same mode yields the same proxy for as long as any handle to that
//! proxy is alive. Asking for the writable proxy of something that already
//! is a read-only proxy returns the read-only proxy unchanged.
//!
//! The identity caches hold proxies weakly. Once every handle to a proxy is
//! gone it is dropped, and the next request builds a fresh one; dead cache
//! entries are pruned as the cache grows.
//!
//! # Revisions
//!
//! The membrane counts mutations. Each [`Proxy`] handle remembers the count
//! at the time it was handed out, and two handles compare equal only when
//! they wrap the same node *and* were handed out at the same revision. A
//! value derived from a deeply tracked signal therefore never looks
//! unchanged after a nested write.

mod handler;
mod reactive;
mod read_only;

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use self::handler::ProxyHandler;
use self::reactive::ReactiveHandler;
use self::read_only::ReadOnlyHandler;
use crate::error::Result;
use crate::value::{Getter, Key, Property, Prototype, Setter, Value};

/// Hook called after a write through a reactive proxy.
pub type ValueMutated = Rc<dyn Fn(&Value, &Key) -> Result<()>>;

/// Hook called on every read through a proxy.
pub type ValueObserved = Rc<dyn Fn(&Value, &Key)>;

/// Predicate deciding which values get wrapped.
pub type ValueIsObservable = Rc<dyn Fn(&Value) -> bool>;

/// Getter exposed through a proxy descriptor. Receives the receiver.
pub type ProxyGetter = Rc<dyn Fn(&Wrapped) -> Wrapped>;

/// Setter exposed through a proxy descriptor.
pub type ProxySetter = Rc<dyn Fn(&Wrapped, Value) -> Result<()>>;

const MIN_PRUNE_THRESHOLD: usize = 64;

/// Options recognised when creating a membrane.
///
/// | option                | default                              |
/// |-----------------------|--------------------------------------|
/// | `value_mutated`       | no-op                                |
/// | `value_observed`      | no-op                                |
/// | `value_is_observable` | arrays and plain objects             |
#[derive(Clone, Default)]
pub struct MembraneOptions {
    value_mutated: Option<ValueMutated>,
    value_observed: Option<ValueObserved>,
    value_is_observable: Option<ValueIsObservable>,
}

impl MembraneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_mutated(mut self, hook: impl Fn(&Value, &Key) -> Result<()> + 'static) -> Self {
        self.value_mutated = Some(Rc::new(hook));
        self
    }

    pub fn value_observed(mut self, hook: impl Fn(&Value, &Key) + 'static) -> Self {
        self.value_observed = Some(Rc::new(hook));
        self
    }

    pub fn value_is_observable(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.value_is_observable = Some(Rc::new(predicate));
        self
    }
}

/// Which kind of proxy a handler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Reactive,
    ReadOnly,
}

/// Weakly held proxies keyed by node address.
struct IdentityCache {
    entries: HashMap<usize, Weak<dyn ProxyHandler>>,
    prune_at: usize,
}

impl IdentityCache {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            prune_at: MIN_PRUNE_THRESHOLD,
        }
    }

    fn get(&self, addr: usize) -> Option<Rc<dyn ProxyHandler>> {
        self.entries.get(&addr).and_then(Weak::upgrade)
    }

    fn insert(&mut self, addr: usize, handler: &Rc<dyn ProxyHandler>) {
        if self.entries.len() >= self.prune_at {
            self.entries.retain(|_, proxy| proxy.strong_count() > 0);
            self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
        }
        self.entries.insert(addr, Rc::downgrade(handler));
    }

    fn live(&self) -> usize {
        self.entries.values().filter(|proxy| proxy.strong_count() > 0).count()
    }
}

type AccessorKey = (Mode, usize);

/// Wrapped accessors keyed by mode and the address of the original closure.
///
/// Both sides are weak: an entry is live while the original and its wrapper
/// are both held somewhere, and dead entries are pruned as the cache grows.
struct AccessorCache<F: ?Sized, W: ?Sized> {
    entries: HashMap<AccessorKey, (Weak<F>, Weak<W>)>,
    prune_at: usize,
}

impl<F: ?Sized, W: ?Sized> AccessorCache<F, W> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            prune_at: MIN_PRUNE_THRESHOLD,
        }
    }

    fn key(mode: Mode, original: &Rc<F>) -> AccessorKey {
        (mode, Rc::as_ptr(original) as *const () as usize)
    }

    fn get(&self, mode: Mode, original: &Rc<F>) -> Option<Rc<W>> {
        let (held, wrapped) = self.entries.get(&Self::key(mode, original))?;
        let held = held.upgrade()?;
        if !Rc::ptr_eq(&held, original) {
            return None;
        }
        wrapped.upgrade()
    }

    fn insert(&mut self, mode: Mode, original: &Rc<F>, wrapped: &Rc<W>) {
        if self.entries.len() >= self.prune_at {
            self.entries
                .retain(|_, (held, wrapped)| held.strong_count() > 0 && wrapped.strong_count() > 0);
            self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
        }
        self.entries.insert(
            Self::key(mode, original),
            (Rc::downgrade(original), Rc::downgrade(wrapped)),
        );
    }
}

pub(crate) struct MembraneInner {
    options: MembraneOptions,
    reactive_graph: RefCell<IdentityCache>,
    read_only_graph: RefCell<IdentityCache>,
    getters: RefCell<AccessorCache<dyn Fn(&Value) -> Value, dyn Fn(&Wrapped) -> Wrapped>>,
    setters: RefCell<AccessorCache<dyn Fn(&Value, Value), dyn Fn(&Wrapped, Value) -> Result<()>>>,
    revision: Cell<u64>,
}

impl MembraneInner {
    fn is_observable(&self, value: &Value) -> bool {
        match &self.options.value_is_observable {
            Some(predicate) => predicate(value),
            None => matches!(value, Value::Array(_)) || value.is_plain_object(),
        }
    }

    fn graph(&self, mode: Mode) -> &RefCell<IdentityCache> {
        match mode {
            Mode::Reactive => &self.reactive_graph,
            Mode::ReadOnly => &self.read_only_graph,
        }
    }

    /// Wrap `value` in a proxy of the given mode, if it is observable.
    pub(crate) fn wrap(self: &Rc<Self>, value: Value, mode: Mode) -> Wrapped {
        if !self.is_observable(&value) {
            return Wrapped::Value(value);
        }
        let Some(addr) = value.node_addr() else {
            return Wrapped::Value(value);
        };

        let graph = self.graph(mode);
        if let Some(handler) = graph.borrow().get(addr) {
            return Wrapped::Proxy(Proxy::new(handler, self.revision.get()));
        }

        let handler: Rc<dyn ProxyHandler> = match mode {
            Mode::Reactive => Rc::new(ReactiveHandler::new(Rc::clone(self), value)),
            Mode::ReadOnly => Rc::new(ReadOnlyHandler::new(Rc::clone(self), value)),
        };
        graph.borrow_mut().insert(addr, &handler);
        tracing::trace!(addr, ?mode, "created proxy");

        Wrapped::Proxy(Proxy::new(handler, self.revision.get()))
    }

    pub(crate) fn value_observed(&self, target: &Value, key: &Key) {
        if let Some(hook) = &self.options.value_observed {
            hook(target, key);
        }
    }

    pub(crate) fn value_mutated(&self, target: &Value, key: &Key) -> Result<()> {
        self.revision.set(self.revision.get() + 1);
        tracing::trace!(%key, revision = self.revision.get(), "value mutated");

        match &self.options.value_mutated {
            Some(hook) => hook(target, key),
            None => Ok(()),
        }
    }

    /// Wrap a getter once per mode; later requests return the same wrapper.
    pub(crate) fn wrap_getter(self: &Rc<Self>, mode: Mode, getter: &Getter) -> ProxyGetter {
        if let Some(wrapped) = self.getters.borrow().get(mode, getter) {
            return wrapped;
        }

        let membrane = Rc::downgrade(self);
        let original = Rc::clone(getter);
        let wrapped: ProxyGetter = Rc::new(move |this: &Wrapped| {
            let value = original(&this.to_value());
            match membrane.upgrade() {
                Some(membrane) => membrane.wrap(value, mode),
                None => Wrapped::Value(value),
            }
        });

        self.getters.borrow_mut().insert(mode, getter, &wrapped);
        wrapped
    }

    /// Wrap a setter once per mode using `make`.
    pub(crate) fn wrap_setter(
        &self,
        mode: Mode,
        setter: &Setter,
        make: impl FnOnce(Setter) -> ProxySetter,
    ) -> ProxySetter {
        if let Some(wrapped) = self.setters.borrow().get(mode, setter) {
            return wrapped;
        }

        let wrapped = make(Rc::clone(setter));
        self.setters.borrow_mut().insert(mode, setter, &wrapped);
        wrapped
    }
}

/// Factory and identity cache for proxies.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ripple_core::membrane::{Membrane, MembraneOptions};
/// use ripple_core::value::Value;
///
/// let writes = Rc::new(Cell::new(0));
/// let membrane = Membrane::new(MembraneOptions::new().value_mutated({
///     let writes = writes.clone();
///     move |_, _| {
///         writes.set(writes.get() + 1);
///         Ok(())
///     }
/// }));
///
/// let state = Value::object([("user", Value::object([("name", "ada")]))]);
/// let proxy = membrane.get_proxy(state.clone());
///
/// proxy.get("user").set("name", "grace").unwrap();
/// assert_eq!(writes.get(), 1);
/// ```
#[derive(Clone)]
pub struct Membrane {
    inner: Rc<MembraneInner>,
}

impl Membrane {
    pub fn new(options: MembraneOptions) -> Self {
        Self {
            inner: Rc::new(MembraneInner {
                options,
                reactive_graph: RefCell::new(IdentityCache::new()),
                read_only_graph: RefCell::new(IdentityCache::new()),
                getters: RefCell::new(AccessorCache::new()),
                setters: RefCell::new(AccessorCache::new()),
                revision: Cell::new(0),
            }),
        }
    }

    /// The writable proxy for `value`, or `value` itself when it is not
    /// observable.
    ///
    /// Proxies created by this membrane are returned unchanged, so a
    /// read-only proxy never turns into a writable one.
    pub fn get_proxy(&self, value: impl Into<Wrapped>) -> Wrapped {
        match value.into() {
            Wrapped::Proxy(proxy) if proxy.belongs_to(self) => Wrapped::Proxy(proxy),
            other => self.inner.wrap(other.to_value(), Mode::Reactive),
        }
    }

    /// The read-only proxy for `value`, or `value` itself when it is not
    /// observable.
    pub fn get_read_only_proxy(&self, value: impl Into<Wrapped>) -> Wrapped {
        match value.into() {
            Wrapped::Proxy(proxy) if proxy.belongs_to(self) && proxy.is_read_only() => {
                Wrapped::Proxy(proxy)
            }
            other => self.inner.wrap(other.to_value(), Mode::ReadOnly),
        }
    }

    /// The original value behind `wrapped`.
    pub fn unwrap_proxy(wrapped: &Wrapped) -> Value {
        wrapped.to_value()
    }

    pub fn is_observable(&self, value: &Value) -> bool {
        self.inner.is_observable(value)
    }

    /// Number of writes reported so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Proxies of the given mode that are still alive.
    pub fn live_proxies(&self, mode: Mode) -> usize {
        self.inner.graph(mode).borrow().live()
    }
}

impl Default for Membrane {
    fn default() -> Self {
        Self::new(MembraneOptions::default())
    }
}

impl fmt::Debug for Membrane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Membrane")
            .field("revision", &self.revision())
            .field("reactive", &self.live_proxies(Mode::Reactive))
            .field("read_only", &self.live_proxies(Mode::ReadOnly))
            .finish()
    }
}

/// Property descriptor as seen through a proxy.
#[derive(Clone)]
pub enum ProxyDescriptor {
    Data {
        value: Wrapped,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<ProxyGetter>,
        set: Option<ProxySetter>,
        enumerable: bool,
        configurable: bool,
    },
}

impl ProxyDescriptor {
    pub fn is_configurable(&self) -> bool {
        match self {
            ProxyDescriptor::Data { configurable, .. }
            | ProxyDescriptor::Accessor { configurable, .. } => *configurable,
        }
    }
}

impl fmt::Debug for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyDescriptor::Data { value, writable, .. } => f
                .debug_struct("Data")
                .field("value", value)
                .field("writable", writable)
                .finish(),
            ProxyDescriptor::Accessor { get, set, .. } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

/// Handle to a proxy.
#[derive(Clone)]
pub struct Proxy {
    handler: Rc<dyn ProxyHandler>,
    revision: u64,
}

impl Proxy {
    fn new(handler: Rc<dyn ProxyHandler>, revision: u64) -> Self {
        Self { handler, revision }
    }

    fn belongs_to(&self, membrane: &Membrane) -> bool {
        Rc::ptr_eq(&self.handler.base().membrane, &membrane.inner)
    }

    /// Whether both handles refer to the same proxy, regardless of revision.
    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mode(&self) -> Mode {
        self.handler.mode()
    }

    pub fn is_read_only(&self) -> bool {
        self.mode() == Mode::ReadOnly
    }

    /// The wrapped node.
    pub fn original(&self) -> Value {
        self.handler.base().original.clone()
    }

    pub fn get(&self, key: impl Into<Key>) -> Wrapped {
        self.handler.get(&key.into())
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.handler.has(&key.into())
    }

    /// Own keys, enumerable or not.
    pub fn own_keys(&self) -> SmallVec<[Key; 8]> {
        self.handler.own_keys()
    }

    /// Own enumerable keys.
    pub fn keys(&self) -> SmallVec<[Key; 8]> {
        self.handler.keys()
    }

    pub fn get_own_property_descriptor(&self, key: impl Into<Key>) -> Option<ProxyDescriptor> {
        self.handler.get_own_property_descriptor(&key.into())
    }

    pub fn get_prototype(&self) -> Option<Prototype> {
        self.handler.get_prototype()
    }

    pub fn is_extensible(&self) -> bool {
        self.handler.is_extensible()
    }

    /// Write a property. Proxies passed as the value are stored unwrapped.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Wrapped>) -> Result<()> {
        self.handler.set(&key.into(), value.into().to_value())
    }

    pub fn delete(&self, key: impl Into<Key>) -> Result<bool> {
        self.handler.delete(&key.into())
    }

    pub fn define_property(&self, key: impl Into<Key>, property: Property) -> Result<bool> {
        self.handler.define_property(&key.into(), property)
    }

    pub fn set_prototype(&self, prototype: Prototype) -> Result<()> {
        self.handler.set_prototype(prototype)
    }

    pub fn prevent_extensions(&self) -> Result<()> {
        self.handler.prevent_extensions()
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.handler.base().original.to_json()
    }

    fn raw(&self, index: usize) -> Value {
        self.handler.base().original.get(&Key::Index(index))
    }

    fn set_len(&self, len: usize) -> Result<()> {
        self.handler.set(&Key::length(), Value::Number(len as f64))
    }

    /// Move the element at `from` to `to`, or punch a hole at `to` when
    /// `from` is empty.
    fn move_element(&self, from: usize, to: usize) -> Result<()> {
        if self.handler.has(&Key::Index(from)) {
            self.handler.set(&Key::Index(to), self.raw(from))
        } else {
            self.handler.delete(&Key::Index(to)).map(drop)
        }
    }

    // Array helpers. They are built from the same traps as direct writes,
    // so every step is reported (or refused) exactly like one.

    /// Length of an array proxy; zero for objects without a numeric length.
    pub fn len(&self) -> usize {
        self.get(Key::length()).as_f64().map_or(0, |len| len as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value, returning the new length.
    pub fn push(&self, value: impl Into<Wrapped>) -> Result<usize> {
        let len = self.len();
        self.handler.set(&Key::Index(len), value.into().to_value())?;
        self.set_len(len + 1)?;
        Ok(len + 1)
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Wrapped> {
        let len = self.len();
        if len == 0 {
            self.set_len(0)?;
            return Ok(Wrapped::Value(Value::Undefined));
        }

        let last = self.get(len - 1);
        self.handler.delete(&Key::Index(len - 1))?;
        self.set_len(len - 1)?;
        Ok(last)
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Result<Wrapped> {
        let len = self.len();
        if len == 0 {
            self.set_len(0)?;
            return Ok(Wrapped::Value(Value::Undefined));
        }

        let first = self.get(0usize);
        for from in 1..len {
            self.move_element(from, from - 1)?;
        }
        self.handler.delete(&Key::Index(len - 1))?;
        self.set_len(len - 1)?;
        Ok(first)
    }

    /// Prepend values, returning the new length.
    pub fn unshift<I>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<Wrapped>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| v.into().to_value()).collect();
        let len = self.len();
        let count = values.len();

        if count > 0 {
            for from in (0..len).rev() {
                self.move_element(from, from + count)?;
            }
            for (index, value) in values.into_iter().enumerate() {
                self.handler.set(&Key::Index(index), value)?;
            }
        }
        self.set_len(len + count)?;
        Ok(len + count)
    }

    /// Remove `delete_count` elements starting at `start` and insert
    /// `items` in their place, returning the removed elements.
    pub fn splice<I>(&self, start: usize, delete_count: usize, items: I) -> Result<Vec<Wrapped>>
    where
        I: IntoIterator,
        I::Item: Into<Wrapped>,
    {
        let len = self.len();
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);

        let removed: Vec<Wrapped> = (start..start + delete_count).map(|i| self.get(i)).collect();
        let tail: Vec<Value> = (start + delete_count..len).map(|i| self.raw(i)).collect();
        let items: Vec<Value> = items.into_iter().map(|v| v.into().to_value()).collect();
        let new_len = start + items.len() + tail.len();

        for (offset, value) in items.into_iter().chain(tail).enumerate() {
            self.handler.set(&Key::Index(start + offset), value)?;
        }
        for index in (new_len..len).rev() {
            self.handler.delete(&Key::Index(index))?;
        }
        self.set_len(new_len)?;
        Ok(removed)
    }

    /// Reverse the elements in place.
    pub fn reverse(&self) -> Result<()> {
        let values: Vec<Value> = (0..self.len()).rev().map(|i| self.raw(i)).collect();
        for (index, value) in values.into_iter().enumerate() {
            self.handler.set(&Key::Index(index), value)?;
        }
        Ok(())
    }

    /// Sort the elements in place.
    pub fn sort_by<F>(&self, mut compare: F) -> Result<()>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let mut values: Vec<Value> = (0..self.len()).map(|i| self.raw(i)).collect();
        values.sort_by(|a, b| compare(a, b));
        for (index, value) in values.into_iter().enumerate() {
            self.handler.set(&Key::Index(index), value)?;
        }
        Ok(())
    }

    /// Every element, wrapped.
    pub fn to_vec(&self) -> Vec<Wrapped> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.revision == other.revision
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("mode", &self.mode())
            .field("target", &self.handler.base().original)
            .field("revision", &self.revision)
            .finish()
    }
}

/// Result of a read through the membrane: a proxy for arrays and plain
/// objects, the value itself for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    Proxy(Proxy),
    Value(Value),
}

impl Wrapped {
    /// Read a property. Reading through a plain value reads the value.
    pub fn get(&self, key: impl Into<Key>) -> Wrapped {
        match self {
            Wrapped::Proxy(proxy) => proxy.get(key),
            Wrapped::Value(value) => Wrapped::Value(value.get(&key.into())),
        }
    }

    /// Write through the proxy. Plain values are not writable and are
    /// left alone.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Wrapped>) -> Result<()> {
        match self {
            Wrapped::Proxy(proxy) => proxy.set(key, value),
            Wrapped::Value(_) => Ok(()),
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Wrapped::Proxy(proxy) => Some(proxy),
            Wrapped::Value(_) => None,
        }
    }

    pub fn is_proxy(&self) -> bool {
        self.as_proxy().is_some()
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Wrapped::Value(value) => value.as_f64(),
            Wrapped::Proxy(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Wrapped::Value(value) => value.as_str(),
            Wrapped::Proxy(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Wrapped::Value(value) => value.as_bool(),
            Wrapped::Proxy(_) => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Wrapped::Value(Value::Undefined))
    }

    /// The value, with any proxy stripped off.
    pub fn to_value(&self) -> Value {
        handler::unwrap(self)
    }

    pub fn into_value(self) -> Value {
        match self {
            Wrapped::Proxy(proxy) => proxy.original(),
            Wrapped::Value(value) => value,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }
}

impl From<Value> for Wrapped {
    fn from(value: Value) -> Self {
        Wrapped::Value(value)
    }
}

impl From<Proxy> for Wrapped {
    fn from(proxy: Proxy) -> Self {
        Wrapped::Proxy(proxy)
    }
}

impl From<f64> for Wrapped {
    fn from(n: f64) -> Self {
        Wrapped::Value(Value::Number(n))
    }
}

impl From<i32> for Wrapped {
    fn from(n: i32) -> Self {
        Wrapped::Value(Value::from(n))
    }
}

impl From<bool> for Wrapped {
    fn from(b: bool) -> Self {
        Wrapped::Value(Value::Bool(b))
    }
}

impl From<&str> for Wrapped {
    fn from(s: &str) -> Self {
        Wrapped::Value(Value::from(s))
    }
}

impl From<String> for Wrapped {
    fn from(s: String) -> Self {
        Wrapped::Value(Value::from(s))
    }
}
