//! Key/value backend.
//!
//! Values are serialised to JSON strings and kept in a [`KeyValueStore`], a
//! thread-safe string map shared by every signal that points at it. A store
//! can serve as a persistent local store, a per-session store or, with
//! expiring entries, a cookie jar.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::StorageAdapter;
use crate::error::{ReactiveError, Result};

const BACKEND: &str = "key_value";

#[derive(Debug, Clone)]
struct Entry {
    raw: String,
    expires_at: Option<SystemTime>,
}

impl Entry {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe map from keys to serialised values.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct KeyValueStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> &'static KeyValueStore {
        static GLOBAL: OnceLock<KeyValueStore> = OnceLock::new();
        GLOBAL.get_or_init(KeyValueStore::new)
    }

    /// Raw value under `key`. Expired entries read as absent and are removed.
    pub fn get_item(&self, key: &str) -> Option<String> {
        let now = SystemTime::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.raw.clone()),
                Some(_) => {}
            }
        }

        tracing::trace!(key, "dropping expired entry");
        self.entries.write().remove(key);
        None
    }

    pub fn set_item(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.insert(key.into(), raw.into(), None);
    }

    /// Store a value that reads as absent from `expires_at` on.
    pub fn set_item_with_expiry(
        &self,
        key: impl Into<String>,
        raw: impl Into<String>,
        expires_at: SystemTime,
    ) {
        self.insert(key.into(), raw.into(), Some(expires_at));
    }

    fn insert(&self, key: String, raw: String, expires_at: Option<SystemTime>) {
        self.entries.write().insert(key, Entry { raw, expires_at });
    }

    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key).map(|entry| entry.raw)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_item(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Storage adapter persisting one key of a [`KeyValueStore`] as JSON.
pub struct KeyValueStorage<T> {
    store: KeyValueStore,
    key: String,
    fallback: T,
    expires_at: Option<SystemTime>,
}

impl<T> KeyValueStorage<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Bind `key` of `store`, writing `value` there if the key is empty.
    pub fn new(store: KeyValueStore, key: impl Into<String>, value: T) -> Self {
        let storage = Self {
            store,
            key: key.into(),
            fallback: value,
            expires_at: None,
        };

        if !storage.store.contains_key(&storage.key) {
            if let Err(error) = storage.write(&storage.fallback) {
                tracing::warn!(key = %storage.key, %error, "could not seed initial value");
            }
        }
        storage
    }

    /// Bind `key` of `store` with entries expiring at `expires_at`.
    ///
    /// Nothing is written until the first `set`; until then, and after the
    /// entry expires, reads return `value`.
    pub fn with_expiry(
        store: KeyValueStore,
        key: impl Into<String>,
        value: T,
        expires_at: SystemTime,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            fallback: value,
            expires_at: Some(expires_at),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Decode the stored value. `Ok(None)` when nothing is stored.
    pub fn read(&self) -> Result<Option<T>> {
        let Some(raw) = self.store.get_item(&self.key) else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| ReactiveError::Storage {
                backend: BACKEND,
                message: format!("cannot decode \"{}\": {error}", self.key),
            })
    }

    /// Encode and store `value`.
    pub fn write(&self, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|error| ReactiveError::Storage {
            backend: BACKEND,
            message: format!("cannot encode \"{}\": {error}", self.key),
        })?;

        match self.expires_at {
            Some(at) => self.store.set_item_with_expiry(self.key.clone(), raw, at),
            None => self.store.set_item(self.key.clone(), raw),
        }
        Ok(())
    }
}

impl<T> StorageAdapter<T> for KeyValueStorage<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    fn get(&self) -> T {
        match self.read() {
            Ok(Some(value)) => value,
            Ok(None) => self.fallback.clone(),
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "falling back to initial value");
                self.fallback.clone()
            }
        }
    }

    fn set(&self, value: T) {
        if let Err(error) = self.write(&value) {
            tracing::error!(key = %self.key, %error, "value was not persisted");
        }
    }
}

/// Storage factory binding a signal to `key` of `store`.
///
/// ```rust
/// use ripple_core::reactive::{Signal, SignalOptions};
/// use ripple_core::storage::{use_key_value, KeyValueStore};
///
/// let store = KeyValueStore::new();
/// let theme = Signal::with_options(
///     String::from("light"),
///     SignalOptions::new().storage(use_key_value(&store, "theme")),
/// );
///
/// theme.set("dark".into()).unwrap();
/// assert_eq!(store.get_item("theme").as_deref(), Some("\"dark\""));
/// ```
pub fn use_key_value<T>(
    store: &KeyValueStore,
    key: impl Into<String>,
) -> impl FnOnce(T) -> KeyValueStorage<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let store = store.clone();
    let key = key.into();
    move |value| KeyValueStorage::new(store, key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn seeds_empty_key_with_initial_value() {
        let store = KeyValueStore::new();
        let storage = KeyValueStorage::new(store.clone(), "count", 3);

        assert_eq!(store.get_item("count").as_deref(), Some("3"));
        assert_eq!(storage.get(), 3);
    }

    #[test]
    fn existing_entry_wins_over_initial_value() {
        let store = KeyValueStore::new();
        store.set_item("count", "9");

        let storage = KeyValueStorage::new(store, "count", 0);
        assert_eq!(storage.get(), 9);
    }

    #[test]
    fn unparsable_entry_reads_as_initial_value() {
        let store = KeyValueStore::new();
        store.set_item("count", "not json");

        let storage = KeyValueStorage::new(store, "count", 5);
        assert_eq!(storage.get(), 5);
        assert!(matches!(storage.read(), Err(ReactiveError::Storage { .. })));
    }

    #[test]
    fn writes_are_json_encoded() {
        let store = KeyValueStore::new();
        let storage = KeyValueStorage::new(store.clone(), "tags", vec!["a".to_string()]);

        storage.set(vec!["a".into(), "b".into()]);
        assert_eq!(store.get_item("tags").as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn expiring_storage_does_not_seed() {
        let store = KeyValueStore::new();
        let later = SystemTime::now() + Duration::from_secs(60);
        let storage = KeyValueStorage::with_expiry(store.clone(), "session", 0, later);

        assert!(store.is_empty());
        assert_eq!(storage.get(), 0);

        storage.set(1);
        assert_eq!(storage.get(), 1);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let store = KeyValueStore::new();
        let past = SystemTime::now() - Duration::from_secs(1);
        store.set_item_with_expiry("stale", "1", past);

        assert_eq!(store.get_item("stale"), None);
        assert!(store.is_empty());

        let storage = KeyValueStorage::with_expiry(store, "stale", 7, past);
        storage.set(8);
        assert_eq!(storage.get(), 7);
    }

    #[test]
    fn store_is_shared_across_threads() {
        let store = KeyValueStore::new();
        let writer = store.clone();

        std::thread::spawn(move || writer.set_item("greeting", "\"hi\""))
            .join()
            .unwrap();

        let storage = KeyValueStorage::new(store, "greeting", String::new());
        assert_eq!(storage.get(), "hi");
    }
}
