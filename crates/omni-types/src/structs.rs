//! World objects and node payloads.
//!
//! [`Anchor`] and [`Downstream`] are the two independently cached groups of
//! a node. They are used both in memory and in the persisted [`NodeRecord`],
//! so a hydrated node carries exactly what was written. On disk both groups
//! are flattened into the record; a group with any field missing reads back
//! as unresolved.

use serde::{Deserialize, Serialize};

use crate::enums::{AnchorSource, NodeKind, ObjectKind};
use crate::ids::{NodeId, ObjectId};
use crate::position::Position;

/// A snapshot of one object as reported by the world-query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// The object's identifier.
    pub id: ObjectId,
    /// What the object is.
    pub kind: ObjectKind,
    /// Where the object is.
    pub pos: Position,
}

/// The resolved anchor of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// The tile a transport unit should stand at or path toward.
    pub anchor_position: Position,
    /// How the tile was chosen.
    pub source: AnchorSource,
    /// Tick the anchor was resolved at.
    pub resolved_at: u64,
}

/// The downstream group of a producer: written together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Downstream {
    /// The terminal sink this producer feeds.
    pub sink_id: NodeId,
    /// The next node one hop downstream.
    pub next_hop_id: NodeId,
    /// Path length to the next hop, in tiles.
    pub next_hop_distance: u32,
    /// Total path length to the sink, in tiles.
    pub sink_distance: u32,
    /// Tiles from the producer to the next hop (start tile excluded).
    pub path: Vec<Position>,
    /// Tick of the resolution pass that produced this group.
    pub last_update_tick: u64,
}

/// The persisted form of a node, stored under `node:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Producer or sink.
    pub kind: NodeKind,
    /// Position of the underlying world object.
    pub origin: Position,
    /// Cached anchor, if resolved.
    #[serde(flatten)]
    pub anchor: Option<Anchor>,
    /// Cached downstream group, if resolved. Always `None` for sinks.
    #[serde(flatten)]
    pub downstream: Option<Downstream>,
    /// Tick a collector placement was last requested for this producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_requested_at: Option<u64>,
}
