//! The routing node entity.
//!
//! A [`Node`] is the in-memory half of a node; [`NodeRecord`] is the
//! persisted half. Both carry the same two cached groups, so converting
//! between them never loses or invents data.

use omni_types::{Anchor, Downstream, NodeId, NodeKind, NodeRecord, Position, RegionId};

use crate::cache::Cached;

/// A routing node: one producer or sink in the logistics network.
///
/// Identity and kind are fixed at creation. The anchor and downstream
/// groups are filled lazily by [`Network`](crate::Network) accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    origin: Position,
    anchor: Cached<Anchor>,
    downstream: Cached<Downstream>,
    collector_requested_at: Option<u64>,
    /// Tick of the last failed downstream resolution. In memory only.
    failed_at: Option<u64>,
}

impl Node {
    /// A freshly classified node with nothing resolved.
    pub const fn new(id: NodeId, kind: NodeKind, origin: Position) -> Self {
        Self {
            id,
            kind,
            origin,
            anchor: Cached::Unresolved,
            downstream: Cached::Unresolved,
            collector_requested_at: None,
            failed_at: None,
        }
    }

    /// Rebuild a node from its persisted form. A downstream group stored
    /// against a sink is dropped.
    pub fn from_record(id: NodeId, record: NodeRecord) -> Self {
        let downstream = if record.kind.is_sink() {
            None
        } else {
            record.downstream
        };
        Self {
            id,
            kind: record.kind,
            origin: record.origin,
            anchor: record.anchor.into(),
            downstream: downstream.into(),
            collector_requested_at: record.collector_requested_at,
            failed_at: None,
        }
    }

    /// The persisted form of this node.
    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            kind: self.kind,
            origin: self.origin.clone(),
            anchor: self.anchor.as_resolved().cloned(),
            downstream: self.downstream.as_resolved().cloned(),
            collector_requested_at: self.collector_requested_at,
        }
    }

    /// The node's identifier (the id of its world object).
    pub const fn id(&self) -> &NodeId {
        &self.id
    }

    /// Producer or sink.
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns `true` for sinks.
    pub const fn is_sink(&self) -> bool {
        self.kind.is_sink()
    }

    /// Position of the underlying world object.
    pub const fn origin(&self) -> &Position {
        &self.origin
    }

    /// Region of the underlying world object.
    pub const fn region(&self) -> &RegionId {
        &self.origin.region
    }

    /// The cached anchor group.
    pub const fn anchor(&self) -> &Cached<Anchor> {
        &self.anchor
    }

    /// The cached downstream group. Always unresolved for sinks.
    pub const fn downstream(&self) -> &Cached<Downstream> {
        &self.downstream
    }

    /// Tick a collector placement was last requested, if ever.
    pub const fn collector_requested_at(&self) -> Option<u64> {
        self.collector_requested_at
    }

    pub(crate) fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = Cached::Resolved(anchor);
    }

    pub(crate) fn clear_anchor(&mut self) {
        self.anchor = Cached::Unresolved;
    }

    /// Install a freshly resolved downstream group. A path-derived anchor
    /// no longer matches the new path and is discarded with it.
    pub(crate) fn set_downstream(&mut self, downstream: Downstream) {
        if self.is_sink() {
            return;
        }
        self.downstream = Cached::Resolved(downstream);
        self.failed_at = None;
        if self
            .anchor
            .as_resolved()
            .is_some_and(|anchor| anchor.source.follows_path())
        {
            self.anchor = Cached::Unresolved;
        }
    }

    pub(crate) fn clear_downstream(&mut self) {
        self.downstream = Cached::Unresolved;
    }

    pub(crate) const fn mark_failed(&mut self, tick: u64) {
        self.failed_at = Some(tick);
    }

    pub(crate) fn failed_at_tick(&self, tick: u64) -> bool {
        self.failed_at == Some(tick)
    }

    pub(crate) const fn note_collector_request(&mut self, tick: u64) {
        self.collector_requested_at = Some(tick);
    }
}

#[cfg(test)]
mod tests {
    use omni_types::AnchorSource;

    use super::*;

    fn downstream(tick: u64) -> Downstream {
        Downstream {
            sink_id: NodeId::new("spawn"),
            next_hop_id: NodeId::new("spawn"),
            next_hop_distance: 2,
            sink_distance: 2,
            path: vec![Position::new("W1N1", 1, 1), Position::new("W1N1", 2, 2)],
            last_update_tick: tick,
        }
    }

    #[test]
    fn new_node_is_unresolved() {
        let node = Node::new(NodeId::new("src"), NodeKind::Producer, Position::new("W1N1", 0, 0));
        assert!(!node.anchor().is_resolved());
        assert!(!node.downstream().is_resolved());
        assert_eq!(node.region(), &RegionId::new("W1N1"));
    }

    #[test]
    fn record_round_trip_keeps_both_groups() {
        let mut node = Node::new(NodeId::new("src"), NodeKind::Producer, Position::new("W1N1", 0, 0));
        node.set_downstream(downstream(4));
        node.set_anchor(Anchor {
            anchor_position: Position::new("W1N1", 1, 1),
            source: AnchorSource::PathHead,
            resolved_at: 4,
        });
        node.note_collector_request(4);

        let rebuilt = Node::from_record(NodeId::new("src"), node.to_record());
        assert_eq!(rebuilt, node);
    }

    #[test]
    fn new_downstream_discards_path_anchor() {
        let mut node = Node::new(NodeId::new("src"), NodeKind::Producer, Position::new("W1N1", 0, 0));
        node.set_anchor(Anchor {
            anchor_position: Position::new("W1N1", 1, 1),
            source: AnchorSource::PathHead,
            resolved_at: 1,
        });
        node.set_downstream(downstream(2));
        assert!(!node.anchor().is_resolved());
    }

    #[test]
    fn new_downstream_keeps_collector_anchor() {
        let mut node = Node::new(NodeId::new("src"), NodeKind::Producer, Position::new("W1N1", 0, 0));
        node.set_anchor(Anchor {
            anchor_position: Position::new("W1N1", 1, 0),
            source: AnchorSource::Collector("box".into()),
            resolved_at: 1,
        });
        node.set_downstream(downstream(2));
        assert!(node.anchor().is_resolved());
    }

    #[test]
    fn sinks_never_hold_downstream() {
        let mut sink = Node::new(NodeId::new("spawn"), NodeKind::Sink, Position::new("W1N1", 5, 5));
        sink.set_downstream(downstream(1));
        assert!(!sink.downstream().is_resolved());

        let mut record = sink.to_record();
        record.downstream = Some(downstream(1));
        let hydrated = Node::from_record(NodeId::new("spawn"), record);
        assert!(!hydrated.downstream().is_resolved());
    }

    #[test]
    fn failure_is_memoized_per_tick() {
        let mut node = Node::new(NodeId::new("src"), NodeKind::Producer, Position::new("W1N1", 0, 0));
        node.mark_failed(9);
        assert!(node.failed_at_tick(9));
        assert!(!node.failed_at_tick(10));
        node.set_downstream(downstream(10));
        assert!(!node.failed_at_tick(9));
    }
}
