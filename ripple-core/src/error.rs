//! Error Types
//!
//! Every fallible operation in the crate reports a [`ReactiveError`]. User
//! code running inside effects and computed values returns [`BoxError`], so
//! any error type can be raised there; the effect that catches it converts it
//! into a [`ReactiveError::Computation`] unless it already is a
//! `ReactiveError`, in which case it travels unchanged.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::reactive::{Identifier, Role};

/// Error type returned by effect and computed bodies.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

/// The write operation that was attempted on a read-only proxy.
///
/// Prototype and extensibility changes name the internal slot they touch
/// (`[[Prototype]]`, `[[Extensible]]`) as the key; setter invocations name
/// the key `setter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Set,
    Delete,
    DefineProperty,
    SetPrototype,
    PreventExtensions,
    InvokeSetter,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Mutation::Set => "set",
            Mutation::Delete => "delete",
            Mutation::DefineProperty => "define",
            Mutation::SetPrototype => "replace",
            Mutation::PreventExtensions => "lock",
            Mutation::InvokeSetter => "invoke",
        };
        f.write_str(verb)
    }
}

/// A user error shared between every place that holds a copy of it.
#[derive(Clone)]
pub struct SharedError(Rc<dyn std::error::Error + 'static>);

impl SharedError {
    pub fn new(error: BoxError) -> Self {
        Self(Rc::from(error))
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + 'static) {
        &*self.0
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Errors raised by the reactive runtime.
#[derive(Debug, Clone, Error)]
pub enum ReactiveError {
    /// An effect re-entered itself more often than the configured bound.
    #[error("circular dependency detected in {role} `{identifier}` after {depth} nested runs")]
    CircularDependency {
        role: Role,
        identifier: Identifier,
        depth: usize,
    },

    /// The body of an effect or computed value failed.
    #[error("{role} `{identifier}` failed: {source}")]
    Computation {
        role: Role,
        identifier: Identifier,
        #[source]
        source: SharedError,
    },

    /// A write was attempted through a read-only proxy.
    #[error("invalid mutation: cannot {operation} \"{key}\" on \"{target}\", \"{target}\" is read-only")]
    ReadOnly {
        target: String,
        key: String,
        operation: Mutation,
    },

    /// An array write would grow the array past its maximum length.
    #[error("invalid array length: cannot set \"{key}\" on \"{target}\"")]
    ArrayLength { target: String, key: String },

    /// The prototype of a reactive proxy cannot be replaced.
    #[error("invalid prototype mutation: the prototype of reactive proxy \"{target}\" cannot be changed")]
    PrototypeChange { target: String },

    /// Async work was started outside a tokio `LocalSet`.
    #[error("{operation} needs a tokio LocalSet to spawn its task on")]
    NoLocalRuntime { operation: &'static str },

    /// A storage backend could not complete an operation.
    #[error("storage backend `{backend}` failed: {message}")]
    Storage {
        backend: &'static str,
        message: String,
    },
}

impl ReactiveError {
    /// Convert an error raised by a user body into a `ReactiveError`.
    ///
    /// Errors that already are `ReactiveError`s keep their variant, so a
    /// circular dependency detected three effects deep is still reported as
    /// one at the outermost call site.
    pub fn from_body(error: BoxError, role: Role, identifier: &Identifier) -> Self {
        match error.downcast::<ReactiveError>() {
            Ok(reactive) => *reactive,
            Err(other) => ReactiveError::Computation {
                role,
                identifier: identifier.clone(),
                source: SharedError::new(other),
            },
        }
    }

    /// Whether this error is the circular-dependency guard firing.
    pub fn is_circular(&self) -> bool {
        matches!(self, ReactiveError::CircularDependency { .. })
    }

    /// Whether this error is an immutability violation.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ReactiveError::ReadOnly { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactive_errors_pass_through_bodies_unchanged() {
        let original = ReactiveError::CircularDependency {
            role: Role::Effect,
            identifier: Identifier::from("inner"),
            depth: 10,
        };
        let boxed: BoxError = Box::new(original);

        let converted = ReactiveError::from_body(boxed, Role::Computed, &Identifier::from("outer"));
        assert!(converted.is_circular());
        assert!(converted.to_string().contains("inner"));
    }

    #[test]
    fn foreign_errors_become_computation_errors() {
        let boxed: BoxError = "boom".into();

        let converted = ReactiveError::from_body(boxed, Role::Computed, &Identifier::from("total"));
        match &converted {
            ReactiveError::Computation { role, identifier, source } => {
                assert_eq!(*role, Role::Computed);
                assert_eq!(identifier.as_str(), "total");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(converted.to_string(), "Computed `total` failed: boom");
    }

    #[test]
    fn read_only_message_names_target_and_key() {
        let error = ReactiveError::ReadOnly {
            target: "[object Object]".into(),
            key: "a".into(),
            operation: Mutation::Set,
        };
        assert_eq!(
            error.to_string(),
            "invalid mutation: cannot set \"a\" on \"[object Object]\", \"[object Object]\" is read-only"
        );
    }
}
