//! Error types for the `omni-world` crate.

use omni_types::{ObjectId, Position, RegionId};

/// Errors that can occur during world queries and construction requests.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A region was not found in the world.
    #[error("region not found: {0}")]
    RegionNotFound(RegionId),

    /// An object was not found in the world.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// No region route exists between the specified regions.
    #[error("no region route from {from} to {to}")]
    NoRegionRoute {
        /// Origin region.
        from: RegionId,
        /// Destination region.
        to: RegionId,
    },

    /// No tile path exists between the specified positions.
    #[error("no path from {from} to {to}")]
    NoPath {
        /// Origin tile.
        from: Position,
        /// Target tile.
        to: Position,
    },

    /// A path search expanded more tiles than its budget allows.
    #[error("path search from {from} exceeded {max_ops} operations")]
    SearchBudgetExhausted {
        /// Origin tile.
        from: Position,
        /// The exhausted budget.
        max_ops: u32,
    },

    /// A position lies outside every region of the world.
    #[error("position out of bounds: {0}")]
    OutOfBounds(Position),

    /// A duplicate region was inserted.
    #[error("duplicate region id: {0}")]
    DuplicateRegion(RegionId),

    /// A duplicate object was inserted.
    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// The world geometry is invalid (e.g. zero-sized regions).
    #[error("invalid world layout: {reason}")]
    InvalidLayout {
        /// Explanation of what is wrong.
        reason: String,
    },
}
