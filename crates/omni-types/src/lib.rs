//! Shared type definitions for the Omni-Union logistics core.
//!
//! This crate is the single source of truth for the identifiers, positions,
//! world-object kinds and persisted node records used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifier wrappers (objects, nodes, regions)
//! - [`enums`] -- Node kinds, world-object kinds, structure kinds
//! - [`position`] -- Region-local tile positions
//! - [`structs`] -- World objects and the cached/persisted node payloads

pub mod enums;
pub mod ids;
pub mod position;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AnchorSource, NodeKind, ObjectKind, StructureKind};
pub use ids::{NodeId, ObjectId, RegionId};
pub use position::Position;
pub use structs::{Anchor, Downstream, NodeRecord, WorldObject};
