//! Infrastructure upkeep for producers.
//!
//! Once a producer has a downstream path, it wants a collector next to the
//! resource and a road along the path. Both are requested through the
//! [`ConstructionService`]; placement itself is the world's business.
//! Only sources and minerals are maintained, and minerals only once their
//! region is developed enough to extract them.

use omni_store::KeyValueStore;
use omni_types::{NodeId, ObjectId, ObjectKind, Position, RegionId, StructureKind};
use omni_world::{ConstructionService, WorldQuery};
use tracing::{debug, info};

use crate::error::NodeError;
use crate::network::Network;

/// What [`Network::ensure_infrastructure`] did for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfrastructureOutcome {
    /// The node is a sink, a deposit, or its object is gone.
    NotApplicable,
    /// The resource kind is not maintained at the region's current level.
    Gated {
        /// The region's level.
        level: u32,
    },
    /// The collector anchor was resolved and roads were requested.
    Maintained {
        /// The producer's anchor tile.
        anchor: Position,
        /// Number of road tiles requested this call.
        roads_requested: usize,
    },
}

impl<W, S, B> Network<'_, W, S, B>
where
    W: WorldQuery + ?Sized,
    S: KeyValueStore,
    B: ConstructionService + ?Sized,
{
    /// The region level, if `id` is a mineral in a region below
    /// `maintenance.mineral_min_level`. Such minerals get no collector and
    /// no roads.
    pub(crate) fn mineral_gate(&self, id: &NodeId, region: &RegionId) -> Option<u32> {
        let world = self.world();
        let is_mineral = world
            .object(&ObjectId::from(id))
            .is_some_and(|object| object.kind == ObjectKind::Mineral);
        let level = world.region_level(region);
        (is_mineral && level < self.config().maintenance.mineral_min_level).then_some(level)
    }

    /// Make sure producer `id` has a collector and a road to its next hop.
    ///
    /// Resolving the anchor requests the collector if none is built or
    /// pending. Roads are requested on every path tile after the first that
    /// has neither a road nor a road site; the first tile is reserved for
    /// the collector.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NoRouteFound`] if the producer has no route.
    pub fn ensure_infrastructure(&mut self, id: &NodeId) -> Result<InfrastructureOutcome, NodeError> {
        let world = self.world();
        let node = self.node(id)?;
        if node.is_sink() {
            return Ok(InfrastructureOutcome::NotApplicable);
        }
        let region = node.region().clone();

        let kind = world.object(&ObjectId::from(id)).map(|object| object.kind);
        match kind {
            Some(ObjectKind::Source | ObjectKind::Mineral) => {}
            _ => return Ok(InfrastructureOutcome::NotApplicable),
        }
        if let Some(level) = self.mineral_gate(id, &region) {
            debug!(node = %id, level, "Mineral producer below maintenance level");
            return Ok(InfrastructureOutcome::Gated { level });
        }

        let anchor = self.anchor_position(id)?;
        let mut roads_requested = 0_usize;
        if self.config().maintenance.build_roads {
            let path = self.path(id)?;
            for tile in path.iter().skip(1) {
                let covered = world.objects_in_range(tile, 0).iter().any(|object| {
                    object.kind.is_built(StructureKind::Road) || object.kind.is_site(StructureKind::Road)
                });
                if covered {
                    continue;
                }
                self.builder().request(tile, StructureKind::Road)?;
                roads_requested = roads_requested.saturating_add(1);
            }
        }

        if roads_requested > 0 {
            info!(tick = self.tick(), node = %id, roads_requested, "Road placement requested");
        }
        Ok(InfrastructureOutcome::Maintained {
            anchor,
            roads_requested,
        })
    }
}
