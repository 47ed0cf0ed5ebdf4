//! In-memory key-value store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Key-value store held entirely in memory.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: Arc::new(Mutex::new(entries.into_iter().collect())),
        }
    }

    /// Copy of every entry, in key order.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KeyValueStoreError::write(key, "store lock poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_values() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("userId"), None);

        store.set("userId", "1").expect("set");
        store.set("userId", "2").expect("set");

        assert_eq!(store.get("userId").as_deref(), Some("2"));
    }

    #[test]
    fn clones_share_entries() {
        let store = MemoryKeyValueStore::with_entries([("a".to_owned(), "1".to_owned())]);
        let clone = store.clone();
        clone.set("b", "2").expect("set");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("b").map(String::as_str), Some("2"));
    }
}
