//! The key-value store interface.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Prefix shared by every node record key.
pub const NODE_KEY_PREFIX: &str = "node:";

/// Key under which the record of node `id` is stored.
pub fn node_key(id: &str) -> String {
    format!("{NODE_KEY_PREFIX}{id}")
}

/// A string-keyed store of JSON documents.
///
/// Backends implement the raw string operations; typed access goes through
/// the provided [`get_json`](Self::get_json) and [`set_json`](Self::set_json).
pub trait KeyValueStore {
    /// Read the raw value at `key`, if present.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a raw value at `key`, replacing any previous value.
    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Serialize `value` as JSON and store it at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if serialization fails.
    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, json)
    }

    /// Read the value at `key` and deserialize it from JSON.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if deserialization fails.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        self.get_raw(key)?
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StoreError::from)
    }
}
