//! World-facing side of the Omni-Union logistics core.
//!
//! The routing engine never touches world state directly. Everything it
//! needs to know about the world (objects, ranges, region routes, tile
//! paths) goes through [`WorldQuery`], and everything it wants built goes
//! through [`ConstructionService`].
//!
//! # Modules
//!
//! - [`error`] -- Error types for world queries and construction.
//! - [`query`] -- The [`WorldQuery`] and [`ConstructionService`] traits.
//! - [`classify`] -- Identifier resolution: which node kind an object is,
//!   and which node a non-node object belongs to.
//! - [`grid`] -- [`GridWorld`], an in-memory world of square regions laid
//!   out on a grid, with BFS region routing and tile pathfinding.
//! - [`starting_world`] -- A small three-region map used by the headless
//!   engine and scenario tests.

pub mod classify;
pub mod error;
pub mod grid;
pub mod query;
pub mod starting_world;

// Re-export primary types at crate root.
pub use classify::{classify, owner_candidates};
pub use error::WorldError;
pub use grid::GridWorld;
pub use query::{ConstructionQueue, ConstructionRequest, ConstructionService, PathOptions, WorldQuery};
pub use starting_world::{StartingObjectIds, create_starting_world};
