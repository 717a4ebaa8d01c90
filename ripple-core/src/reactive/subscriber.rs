//! Subscriber types for the reactive system.
//!
//! An observer is any computation that depends on reactive values: effects,
//! and through them computed values and resources. Signals hold observer
//! handles in their subscriber sets and invoke them when they change.

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Each observer gets a unique ID when created. Signals key their subscriber
/// sets by this ID, which is what keeps an observer from being registered
/// twice on the same signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// What kind of primitive an observer belongs to. Used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Effect,
    Computed,
    Resource,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Effect => "Effect",
            Role::Computed => "Computed",
            Role::Resource => "Resource",
        };
        f.write_str(name)
    }
}

/// Human-readable name of an effect, computed value or resource.
///
/// Callers may supply their own; otherwise one is derived from the role and
/// subscriber ID, so every primitive always has one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<str>);

impl Identifier {
    /// Derive a default identifier.
    pub fn generate(role: Role, id: SubscriberId) -> Self {
        Self(format!("{}#{}", role.to_string().to_lowercase(), id.raw()).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

/// A re-invokable reactive computation.
pub trait Observer {
    /// The observer's unique ID.
    fn subscriber_id(&self) -> SubscriberId;

    /// Called by a source whose value changed. Runs the computation again.
    fn notify(&self) -> Result<()>;

    /// Record that the current run read `source`, so the subscription can be
    /// dropped before the next run.
    fn depends_on(&self, source: Weak<dyn Source>);
}

/// Something observers can subscribe to.
pub trait Source {
    /// Remove `subscriber` from this source's subscriber set.
    fn unsubscribe(&self, subscriber: SubscriberId);
}

/// Shared handle to an observer. This is what lives on the observer stack
/// and in subscriber sets.
pub type ObserverHandle = Rc<dyn Observer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn generated_identifiers_name_the_role() {
        let id = SubscriberId::new();
        let identifier = Identifier::generate(Role::Computed, id);
        assert_eq!(identifier.as_str(), format!("computed#{}", id.raw()));
    }
}
