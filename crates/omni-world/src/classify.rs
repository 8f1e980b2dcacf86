//! Identifier resolution: from a world object to the node it is or serves.
//!
//! Only resources and spawns *are* nodes. Containers, storages, extractors
//! and transport units *belong to* a node, found by looking around them:
//!
//! | Object | Owner lookup |
//! |--------|--------------|
//! | Source, Mineral, Deposit, Spawn | itself |
//! | Container | sources, then minerals, within 1 tile |
//! | Storage | spawns within 2 tiles |
//! | Extractor | the mineral on its own tile |
//! | Transport unit | its assigned node, if any |
//!
//! Nothing here stores a node reference on the object; callers take the
//! returned ids to the registry.

use omni_types::{NodeKind, ObjectId, ObjectKind, WorldObject};

use crate::query::WorldQuery;

/// Range around a container searched for the resource it collects from.
pub const CONTAINER_OWNER_RANGE: u32 = 1;

/// Range around a storage searched for the spawn it serves.
pub const STORAGE_OWNER_RANGE: u32 = 2;

/// Classify an object as a node kind, or `None` if it cannot be a node.
pub fn classify(object: &WorldObject) -> Option<NodeKind> {
    match object.kind {
        ObjectKind::Source | ObjectKind::Mineral | ObjectKind::Deposit => Some(NodeKind::Producer),
        ObjectKind::Spawn => Some(NodeKind::Sink),
        _ => None,
    }
}

/// Ids of the node objects `object` could belong to, most preferred first.
///
/// Empty if the object is not part of any node.
pub fn owner_candidates<W: WorldQuery + ?Sized>(world: &W, object: &WorldObject) -> Vec<ObjectId> {
    if classify(object).is_some() {
        return vec![object.id.clone()];
    }

    match &object.kind {
        ObjectKind::Container => {
            let nearby = world.objects_in_range(&object.pos, CONTAINER_OWNER_RANGE);
            let sources = nearby.iter().filter(|o| o.kind == ObjectKind::Source);
            let minerals = nearby.iter().filter(|o| o.kind == ObjectKind::Mineral);
            sources.chain(minerals).map(|o| o.id.clone()).collect()
        }
        ObjectKind::Storage => world
            .objects_in_range(&object.pos, STORAGE_OWNER_RANGE)
            .into_iter()
            .filter(|o| o.kind == ObjectKind::Spawn)
            .map(|o| o.id)
            .collect(),
        ObjectKind::Extractor => world
            .objects_in_range(&object.pos, 0)
            .into_iter()
            .filter(|o| o.kind == ObjectKind::Mineral)
            .map(|o| o.id)
            .collect(),
        ObjectKind::TransportUnit {
            assigned_node: Some(node),
        } => vec![ObjectId::from(node)],
        _ => Vec::new(),
    }
}
