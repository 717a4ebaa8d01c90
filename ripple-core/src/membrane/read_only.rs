//! Handler for read-only proxies.
//!
//! Reads behave exactly like the reactive handler's, with nested values
//! wrapped read-only. Every write trap fails without touching the target.

use std::rc::Rc;

use super::handler::{BaseHandler, ProxyHandler};
use super::{MembraneInner, Mode, ProxySetter, Wrapped};
use crate::error::{Mutation, ReactiveError, Result};
use crate::value::{Key, Property, Prototype, Setter, Value};

pub(crate) struct ReadOnlyHandler {
    base: BaseHandler,
}

impl ReadOnlyHandler {
    pub(crate) fn new(membrane: Rc<MembraneInner>, original: Value) -> Self {
        Self {
            base: BaseHandler::new(membrane, original),
        }
    }

    fn violation(&self, key: impl ToString, operation: Mutation) -> ReactiveError {
        let error = ReactiveError::ReadOnly {
            target: self.base.original.describe(),
            key: key.to_string(),
            operation,
        };
        tracing::debug!(%error, "rejected write through read-only proxy");
        error
    }
}

impl ProxyHandler for ReadOnlyHandler {
    fn base(&self) -> &BaseHandler {
        &self.base
    }

    fn mode(&self) -> Mode {
        Mode::ReadOnly
    }

    fn set(&self, key: &Key, _value: Value) -> Result<()> {
        Err(self.violation(key, Mutation::Set))
    }

    fn delete(&self, key: &Key) -> Result<bool> {
        Err(self.violation(key, Mutation::Delete))
    }

    fn define_property(&self, key: &Key, _property: Property) -> Result<bool> {
        Err(self.violation(key, Mutation::DefineProperty))
    }

    fn set_prototype(&self, _prototype: Prototype) -> Result<()> {
        Err(self.violation("[[Prototype]]", Mutation::SetPrototype))
    }

    fn prevent_extensions(&self) -> Result<()> {
        Err(self.violation("[[Extensible]]", Mutation::PreventExtensions))
    }

    fn wrap_setter(&self, setter: &Setter) -> ProxySetter {
        self.base.membrane.wrap_setter(Mode::ReadOnly, setter, |_original| {
            Rc::new(|this: &Wrapped, _value: Value| -> Result<()> {
                Err(ReactiveError::ReadOnly {
                    target: this.to_value().describe(),
                    key: "setter".into(),
                    operation: Mutation::InvokeSetter,
                })
            })
        })
    }
}
