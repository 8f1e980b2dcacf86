//! Persistent key-value store for the Omni-Union logistics core.
//!
//! The store is the only state that survives between ticks (and process
//! restarts). Values are JSON documents addressed by string keys.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `node:{id}` | JSON | Persisted node record |
//!
//! # Modules
//!
//! - [`kv`] -- The [`KeyValueStore`] trait and typed JSON helpers
//! - [`memory`] -- [`MemoryStore`], a map-backed store
//! - [`file`] -- [`FileStore`], a map-backed store snapshotted to a JSON file
//! - [`error`] -- Shared error types

pub mod error;
pub mod file;
pub mod kv;
pub mod memory;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use file::FileStore;
pub use kv::{KeyValueStore, NODE_KEY_PREFIX, node_key};
pub use memory::MemoryStore;
