//! File-backed store.
//!
//! The whole store is one JSON object (`{"key": "value", ...}`) read at
//! [`open`](FileStore::open) and written back on [`flush`](FileStore::flush).
//! Between those, all operations hit the in-memory copy, so the engine
//! never does file I/O in the middle of a tick.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::memory::MemoryStore;

/// A [`KeyValueStore`] snapshotted to a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open the store at `path`, loading it if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Serialization`] if it is not a JSON string map.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries: BTreeMap<String, String> = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        tracing::info!(path = %path.display(), keys = entries.len(), "Store opened");
        Ok(Self {
            path,
            inner: MemoryStore::from_entries(entries),
            dirty: false,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if there are writes not yet flushed.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store to its file if anything changed since the last flush.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self.inner.entries())?;
        std::fs::write(&self.path, json)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), keys = self.inner.len(), "Store flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_raw(key)
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.set_raw(key, value)?;
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)?;
        self.dirty = true;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.keys_with_prefix(prefix)
    }
}
