//! Anchor tile selection.
//!
//! A producer's anchor is its collector when one is built next to the
//! resource. Until then the first tile of its downstream path stands in,
//! and a collector is requested there. A sink's anchor is a storage near
//! the spawn, or a fixed tile beside the spawn.

use omni_types::{Anchor, AnchorSource, ObjectKind, Position, StructureKind, WorldObject};
use omni_world::WorldQuery;

/// Range around a resource searched for its collector.
pub const COLLECTOR_RANGE: u32 = 1;

/// A built collector adjacent to `origin`, if any.
pub fn find_collector<W: WorldQuery + ?Sized>(world: &W, origin: &Position) -> Option<WorldObject> {
    world
        .objects_in_range(origin, COLLECTOR_RANGE)
        .into_iter()
        .find(|object| object.kind.is_built(StructureKind::Container))
}

/// Returns `true` if a collector is under construction adjacent to `origin`.
pub fn has_pending_collector<W: WorldQuery + ?Sized>(world: &W, origin: &Position) -> bool {
    world
        .objects_in_range(origin, COLLECTOR_RANGE)
        .iter()
        .any(|object| object.kind.is_site(StructureKind::Container))
}

/// Anchor for a sink whose spawn is at `origin`.
pub fn sink_anchor<W: WorldQuery + ?Sized>(world: &W, origin: &Position, storage_range: u32, tick: u64) -> Anchor {
    let storage = world
        .objects_in_range(origin, storage_range)
        .into_iter()
        .find(|object| object.kind == ObjectKind::Storage);

    match storage {
        Some(storage) => Anchor {
            anchor_position: storage.pos,
            source: AnchorSource::Storage(storage.id),
            resolved_at: tick,
        },
        None => Anchor {
            anchor_position: fallback_tile(origin),
            source: AnchorSource::Fallback,
            resolved_at: tick,
        },
    }
}

/// The tile directly above `origin`, or below it on the top row.
pub fn fallback_tile(origin: &Position) -> Position {
    let dy = if origin.y > 0 { -1 } else { 1 };
    origin.offset(0, dy).unwrap_or_else(|| origin.clone())
}

/// Returns `true` if the structure an anchor points at still exists.
pub fn still_standing<W: WorldQuery + ?Sized>(world: &W, anchor: &Anchor) -> bool {
    match &anchor.source {
        AnchorSource::Collector(id) => world
            .object(id)
            .is_some_and(|object| object.kind.is_built(StructureKind::Container)),
        AnchorSource::Storage(id) => world
            .object(id)
            .is_some_and(|object| object.kind == ObjectKind::Storage),
        AnchorSource::PendingCollector | AnchorSource::PathHead | AnchorSource::Fallback => true,
    }
}
