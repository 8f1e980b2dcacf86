//! Enumeration types for the Omni-Union logistics core.

use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, ObjectId};

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// The role a routing node plays in the network. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A resource-generating location whose output must be routed downstream.
    Producer,
    /// A terminal collection point; the destination of all routing.
    Sink,
}

impl NodeKind {
    /// Returns `true` for [`NodeKind::Sink`].
    pub const fn is_sink(self) -> bool {
        matches!(self, Self::Sink)
    }
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// A structure type that can be requested from the construction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Collector placed next to a resource.
    Container,
    /// Road tile along a transport path.
    Road,
    /// Central storage placed near a spawn.
    Storage,
    /// Extractor placed on a mineral.
    Extractor,
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// What a world object is, as reported by the world-query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Regenerating energy source.
    Source,
    /// Mineral deposit (harvestable once an extractor exists).
    Mineral,
    /// Temporary high-yield deposit.
    Deposit,
    /// Unit-producing structure; the collection point of a region.
    Spawn,
    /// Built central storage.
    Storage,
    /// Built collector.
    Container,
    /// Built mineral extractor.
    Extractor,
    /// Built road tile.
    Road,
    /// Structure awaiting construction.
    ConstructionSite(StructureKind),
    /// Transport-capable unit, optionally assigned to a node.
    TransportUnit {
        /// The node this unit serves, if any.
        assigned_node: Option<NodeId>,
    },
}

impl ObjectKind {
    /// Returns `true` for objects that generate a routable resource.
    pub const fn is_resource(&self) -> bool {
        matches!(self, Self::Source | Self::Mineral | Self::Deposit)
    }

    /// Returns `true` if this is a built structure of the given kind.
    pub fn is_built(&self, kind: StructureKind) -> bool {
        matches!(
            (self, kind),
            (Self::Container, StructureKind::Container)
                | (Self::Road, StructureKind::Road)
                | (Self::Storage, StructureKind::Storage)
                | (Self::Extractor, StructureKind::Extractor)
        )
    }

    /// Returns `true` if this is a pending construction site of the given kind.
    pub fn is_site(&self, kind: StructureKind) -> bool {
        matches!(self, Self::ConstructionSite(k) if *k == kind)
    }
}

// ---------------------------------------------------------------------------
// Anchor provenance
// ---------------------------------------------------------------------------

/// Where a node's anchor position came from.
///
/// Recorded alongside the anchor so that path-derived anchors can be
/// discarded when the path is recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum AnchorSource {
    /// A built collector verified adjacent to the producer's resource.
    Collector(ObjectId),
    /// A collector is under construction; the path head is used meanwhile.
    PendingCollector,
    /// No collector yet; a placement was requested at the path head.
    PathHead,
    /// A built storage near the sink's spawn.
    Storage(ObjectId),
    /// No storage yet; the fixed tile beside the spawn.
    Fallback,
}

impl AnchorSource {
    /// Returns `true` if the anchor was taken from the cached path.
    pub const fn follows_path(&self) -> bool {
        matches!(self, Self::PendingCollector | Self::PathHead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_objects_are_classified() {
        assert!(ObjectKind::Source.is_resource());
        assert!(ObjectKind::Mineral.is_resource());
        assert!(!ObjectKind::Spawn.is_resource());
        assert!(!ObjectKind::TransportUnit { assigned_node: None }.is_resource());
    }

    #[test]
    fn sites_and_built_structures_differ() {
        let site = ObjectKind::ConstructionSite(StructureKind::Container);
        assert!(site.is_site(StructureKind::Container));
        assert!(!site.is_built(StructureKind::Container));
        assert!(ObjectKind::Container.is_built(StructureKind::Container));
        assert!(!ObjectKind::Container.is_site(StructureKind::Container));
    }

    #[test]
    fn anchor_source_round_trips_through_json() {
        let source = AnchorSource::Collector(ObjectId::new("c-1"));
        let json = serde_json::to_string(&source).unwrap_or_default();
        let back: Result<AnchorSource, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(source));
    }
}
