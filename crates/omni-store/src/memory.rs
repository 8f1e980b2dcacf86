//! Map-backed store. Used in tests and as the in-process half of
//! [`FileStore`](crate::FileStore).

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// A [`KeyValueStore`] held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            writes: 0,
        }
    }

    /// Create a store pre-populated with `entries`.
    pub const fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries, writes: 0 }
    }

    /// All entries, in key order.
    pub const fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of successful writes since creation.
    pub const fn writes(&self) -> u64 {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}
