//! Handler for writable proxies.
//!
//! Writes go straight to the original target and are reported through the
//! membrane's `value_mutated` hook.

use std::rc::Rc;

use super::handler::{BaseHandler, ProxyHandler};
use super::{MembraneInner, Mode, ProxySetter, Wrapped};
use crate::error::{ReactiveError, Result};
use crate::value::{Key, Property, Prototype, Setter, Value};

pub(crate) struct ReactiveHandler {
    base: BaseHandler,
}

impl ReactiveHandler {
    pub(crate) fn new(membrane: Rc<MembraneInner>, original: Value) -> Self {
        Self {
            base: BaseHandler::new(membrane, original),
        }
    }
}

impl ProxyHandler for ReactiveHandler {
    fn base(&self) -> &BaseHandler {
        &self.base
    }

    fn mode(&self) -> Mode {
        Mode::Reactive
    }

    fn set(&self, key: &Key, value: Value) -> Result<()> {
        let original = &self.base.original;
        if !original.is_array_write_in_range(key, &value) {
            return Err(ReactiveError::ArrayLength {
                target: original.describe(),
                key: key.to_string(),
            });
        }
        let previous = original.get(key);

        if !previous.same_value(&value) {
            original.set(key, value);
            self.base.membrane.value_mutated(original, key)
        } else if key.is_length() && matches!(original, Value::Array(_)) {
            // After an index write past the end the length already matches,
            // but the length write is still a mutation.
            self.base.membrane.value_mutated(original, key)
        } else {
            Ok(())
        }
    }

    fn delete(&self, key: &Key) -> Result<bool> {
        let original = &self.base.original;
        let deleted = original.delete(key);
        self.base.membrane.value_mutated(original, key)?;
        Ok(deleted)
    }

    fn define_property(&self, key: &Key, property: Property) -> Result<bool> {
        let original = &self.base.original;
        let configurable = property.is_configurable();

        let defined = original.define_property(key, property);
        if defined && !configurable {
            self.copy_into_shadow(key);
        }
        self.base.membrane.value_mutated(original, key)?;
        Ok(defined)
    }

    fn set_prototype(&self, _prototype: Prototype) -> Result<()> {
        Err(ReactiveError::PrototypeChange {
            target: self.base.original.describe(),
        })
    }

    fn prevent_extensions(&self) -> Result<()> {
        if self.base.shadow_is_extensible() {
            self.base.original.prevent_extensions();
            self.lock_shadow();
        }
        Ok(())
    }

    fn wrap_setter(&self, setter: &Setter) -> ProxySetter {
        self.base.membrane.wrap_setter(Mode::Reactive, setter, |original| {
            Rc::new(move |this: &Wrapped, value: Value| -> Result<()> {
                original(&this.to_value(), value);
                Ok(())
            })
        })
    }
}
