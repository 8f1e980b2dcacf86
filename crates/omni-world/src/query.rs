//! Interfaces the logistics core consumes from the outside world.
//!
//! Implementations are expected to be cheap to call repeatedly within a
//! tick, except for [`WorldQuery::find_path`], which is the expensive
//! operation the downstream search tries hard to avoid.

use omni_types::{ObjectId, Position, RegionId, StructureKind, WorldObject};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Options for a point-to-point path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// The search succeeds once the path ends within this many tiles of the
    /// target.
    pub range: u32,
    /// Maximum number of tiles the search may expand before giving up.
    pub max_ops: u32,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            range: 1,
            max_ops: 4000,
        }
    }
}

/// Read-only access to world state.
pub trait WorldQuery {
    /// Look up an object by id. Returns `None` if it no longer exists.
    fn object(&self, id: &ObjectId) -> Option<WorldObject>;

    /// All objects within `range` tiles (Chebyshev) of `pos`, in world order.
    fn objects_in_range(&self, pos: &Position, range: u32) -> Vec<WorldObject>;

    /// All objects inside `region`, in world order.
    fn objects_in_region(&self, region: &RegionId) -> Vec<WorldObject>;

    /// Coarse route between two regions: the regions entered after leaving
    /// `from`, ending with `to`. Empty when `from == to`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoRegionRoute`] if `to` is unreachable.
    fn region_route(&self, from: &RegionId, to: &RegionId) -> Result<Vec<RegionId>, WorldError>;

    /// Tile path from `from` to within `options.range` of `to`. The start
    /// tile is excluded; the path is empty if `from` is already in range.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoPath`] if no path exists, or
    /// [`WorldError::SearchBudgetExhausted`] if the budget ran out.
    fn find_path(
        &self,
        from: &Position,
        to: &Position,
        options: PathOptions,
    ) -> Result<Vec<Position>, WorldError>;

    /// Cheap lower bound on the number of region transitions between two
    /// regions. `None` if either region is unknown.
    fn region_linear_distance(&self, from: &RegionId, to: &RegionId) -> Option<u32>;

    /// Straight-line tile distance between two positions, a lower bound on
    /// any path length between them. `None` if either is unknown.
    fn tile_distance(&self, from: &Position, to: &Position) -> Option<u32>;

    /// Development level of a region (0 if unowned or unknown).
    fn region_level(&self, region: &RegionId) -> u32;
}

/// A single placement request handed to the construction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionRequest {
    /// Where to build.
    pub pos: Position,
    /// What to build.
    pub kind: StructureKind,
}

/// The building-placement collaborator.
pub trait ConstructionService {
    /// Ask for a structure of `kind` to be placed at `pos`.
    ///
    /// # Errors
    ///
    /// Implementations may reject a placement with a [`WorldError`].
    fn request(&mut self, pos: &Position, kind: StructureKind) -> Result<(), WorldError>;
}

/// A [`ConstructionService`] that records requests for the orchestrator to
/// apply between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionQueue {
    requests: Vec<ConstructionRequest>,
}

impl ConstructionQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    /// Requests recorded so far, in order.
    pub fn requests(&self) -> &[ConstructionRequest] {
        &self.requests
    }

    /// Number of requests of the given kind.
    pub fn count_of(&self, kind: StructureKind) -> usize {
        self.requests.iter().filter(|r| r.kind == kind).count()
    }

    /// Take all recorded requests, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<ConstructionRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl ConstructionService for ConstructionQueue {
    fn request(&mut self, pos: &Position, kind: StructureKind) -> Result<(), WorldError> {
        let request = ConstructionRequest {
            pos: pos.clone(),
            kind,
        };
        if !self.requests.contains(&request) {
            tracing::debug!(%pos, ?kind, "Construction requested");
            self.requests.push(request);
        }
        Ok(())
    }
}
