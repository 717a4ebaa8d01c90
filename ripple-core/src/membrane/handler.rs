//! Traps shared by both proxy kinds.
//!
//! Every proxy forwards to a [`ProxyHandler`]. Read traps are identical for
//! reactive and read-only proxies and live here as default methods; write
//! traps differ and are supplied by the two handler types.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::{MembraneInner, Mode, ProxyDescriptor, ProxyGetter, ProxySetter, Wrapped};
use crate::error::Result;
use crate::value::{Getter, Key, Property, Prototype, Setter, Value};

/// Inert stand-in for the original target, kept consistent with it for the
/// properties a proxy has promised not to change.
struct ShadowTarget {
    extensible: bool,
    descriptors: IndexMap<Key, ProxyDescriptor>,
}

/// State every handler carries.
pub(crate) struct BaseHandler {
    pub(crate) original: Value,
    pub(crate) membrane: Rc<MembraneInner>,
    shadow: RefCell<ShadowTarget>,
}

impl BaseHandler {
    pub(crate) fn new(membrane: Rc<MembraneInner>, original: Value) -> Self {
        Self {
            original,
            membrane,
            shadow: RefCell::new(ShadowTarget {
                extensible: true,
                descriptors: IndexMap::new(),
            }),
        }
    }

    pub(crate) fn shadow_is_extensible(&self) -> bool {
        self.shadow.borrow().extensible
    }

    pub(crate) fn shadow_len(&self) -> usize {
        self.shadow.borrow().descriptors.len()
    }

    fn shadow_descriptor(&self, key: &Key) -> Option<ProxyDescriptor> {
        self.shadow.borrow().descriptors.get(key).cloned()
    }
}

pub(crate) trait ProxyHandler {
    fn base(&self) -> &BaseHandler;

    fn mode(&self) -> Mode;

    // Write traps.

    fn set(&self, key: &Key, value: Value) -> Result<()>;

    fn delete(&self, key: &Key) -> Result<bool>;

    fn define_property(&self, key: &Key, property: Property) -> Result<bool>;

    fn set_prototype(&self, prototype: Prototype) -> Result<()>;

    fn prevent_extensions(&self) -> Result<()>;

    fn wrap_setter(&self, setter: &Setter) -> ProxySetter;

    // Shared traps.

    fn wrap_value(&self, value: Value) -> Wrapped {
        self.base().membrane.wrap(value, self.mode())
    }

    fn wrap_getter(&self, getter: &Getter) -> ProxyGetter {
        self.base().membrane.wrap_getter(self.mode(), getter)
    }

    fn get(&self, key: &Key) -> Wrapped {
        let base = self.base();
        let value = base.original.get(key);
        base.membrane.value_observed(&base.original, key);
        self.wrap_value(value)
    }

    fn has(&self, key: &Key) -> bool {
        let base = self.base();
        base.membrane.value_observed(&base.original, key);
        base.original.has(key)
    }

    fn own_keys(&self) -> SmallVec<[Key; 8]> {
        self.base().original.own_keys()
    }

    fn keys(&self) -> SmallVec<[Key; 8]> {
        self.base().original.keys()
    }

    fn get_prototype(&self) -> Option<Prototype> {
        self.base().original.prototype()
    }

    fn is_extensible(&self) -> bool {
        let base = self.base();
        if !base.shadow_is_extensible() {
            return false;
        }
        if !base.original.is_extensible() {
            self.lock_shadow();
            return false;
        }
        true
    }

    fn get_own_property_descriptor(&self, key: &Key) -> Option<ProxyDescriptor> {
        let base = self.base();
        base.membrane.value_observed(&base.original, key);

        let property = base.original.own_property(key)?;
        if let Some(shadowed) = base.shadow_descriptor(key) {
            return Some(shadowed);
        }

        let descriptor = self.wrap_descriptor(property);
        if !descriptor.is_configurable() {
            base.shadow
                .borrow_mut()
                .descriptors
                .insert(key.clone(), descriptor.clone());
        }
        Some(descriptor)
    }

    fn wrap_descriptor(&self, property: Property) -> ProxyDescriptor {
        match property {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => ProxyDescriptor::Data {
                value: self.wrap_value(value),
                writable,
                enumerable,
                configurable,
            },
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => ProxyDescriptor::Accessor {
                get: get.as_ref().map(|get| self.wrap_getter(get)),
                set: set.as_ref().map(|set| self.wrap_setter(set)),
                enumerable,
                configurable,
            },
        }
    }

    fn copy_into_shadow(&self, key: &Key) {
        if let Some(property) = self.base().original.own_property(key) {
            let descriptor = self.wrap_descriptor(property);
            self.base()
                .shadow
                .borrow_mut()
                .descriptors
                .insert(key.clone(), descriptor);
        }
    }

    /// Copy every own property into the shadow target and mark it
    /// non-extensible.
    fn lock_shadow(&self) {
        let base = self.base();
        let keys = base.original.own_keys();
        let descriptors: Vec<(Key, ProxyDescriptor)> = keys
            .into_iter()
            .filter_map(|key| {
                let property = base.original.own_property(&key)?;
                Some((key, self.wrap_descriptor(property)))
            })
            .collect();

        let mut shadow = base.shadow.borrow_mut();
        shadow.descriptors.extend(descriptors);
        shadow.extensible = false;
        tracing::trace!(mode = ?self.mode(), properties = shadow.descriptors.len(), "shadow target locked");
    }
}

/// Strip a proxy down to the value it wraps.
pub(crate) fn unwrap(wrapped: &Wrapped) -> Value {
    match wrapped {
        Wrapped::Proxy(proxy) => proxy.handler.base().original.clone(),
        Wrapped::Value(value) => value.clone(),
    }
}
