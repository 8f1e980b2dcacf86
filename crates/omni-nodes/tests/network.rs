//! Scenario tests for lazy resolution, caching and refresh of the node
//! network, driven through [`Network`] sessions over a [`GridWorld`].

// Panicking on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::too_many_lines
)]

mod common;

use common::{CountingWorld, Harness, place, row_world};
use omni_nodes::{InfrastructureOutcome, NodeError};
use omni_store::KeyValueStore;
use omni_types::{AnchorSource, Downstream, NodeId, NodeKind, NodeRecord, ObjectKind, Position, RegionId, StructureKind};
use omni_world::WorldQuery;

fn id(raw: &str) -> NodeId {
    NodeId::new(raw)
}

/// One 10x10 region with producer P1 at (2,5) and sink S1 at (8,6).
fn single_region() -> Harness {
    let mut world = row_world(10, &["W1N1"]);
    place(&mut world, "P1", ObjectKind::Source, "W1N1", 2, 5);
    place(&mut world, "S1", ObjectKind::Spawn, "W1N1", 8, 6);
    let mut h = Harness::new(world);
    h.registry
        .discover(&h.world, &mut h.store, &[RegionId::new("W1N1")])
        .expect("discover");
    h
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn producer_routes_to_only_sink() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    assert_eq!(net.anchor_position(&id("S1")).unwrap(), Position::new("W1N1", 8, 5));
    assert_eq!(net.sink_id(&id("P1")).unwrap(), id("S1"));
    assert_eq!(net.next_hop_id(&id("P1")).unwrap(), id("S1"));
    assert_eq!(net.next_hop_distance(&id("P1")).unwrap(), 5);
    assert_eq!(net.sink_distance(&id("P1")).unwrap(), 5);

    let path = net.path(&id("P1")).unwrap();
    assert_eq!(path.len(), 5);
    assert!(path.last().unwrap().in_range_of(&Position::new("W1N1", 8, 5), 1));
    assert_eq!(net.downstream(&id("P1")).unwrap().last_update_tick, 1);
    assert_eq!(net.next_hop(&id("P1")).unwrap().kind(), NodeKind::Sink);
    assert_eq!(net.sink_node(&id("P1")).unwrap().id(), &id("S1"));
}

#[test]
fn sink_is_its_own_terminal() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 3);

    for _ in 0..2 {
        assert_eq!(net.next_hop_id(&id("S1")).unwrap(), id("S1"));
        assert_eq!(net.sink_id(&id("S1")).unwrap(), id("S1"));
        assert_eq!(net.next_hop_distance(&id("S1")).unwrap(), 0);
        assert_eq!(net.sink_distance(&id("S1")).unwrap(), 0);
        assert!(net.path(&id("S1")).unwrap().is_empty());
        net.force_refresh(&id("S1")).unwrap();
    }
    assert!(!net.registry().peek(&id("S1")).unwrap().downstream().is_resolved());
}

#[test]
fn fewer_region_transitions_wins() {
    let mut world = row_world(10, &["A", "B", "C"]);
    place(&mut world, "P", ObjectKind::Source, "A", 5, 5);
    place(&mut world, "S1", ObjectKind::Spawn, "C", 5, 5);
    place(&mut world, "S2", ObjectKind::Spawn, "B", 5, 5);
    let mut h = Harness::new(world);
    // S1 is discovered first but is two transitions away.
    for raw in ["S1", "S2", "P"] {
        h.registry.get(&id(raw), &h.world, &mut h.store).unwrap();
    }

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    assert_eq!(net.sink_id(&id("P")).unwrap(), id("S2"));
}

#[test]
fn no_sink_means_no_route() {
    let mut world = row_world(10, &["W1N1"]);
    place(&mut world, "P2", ObjectKind::Source, "W1N1", 4, 4);
    let mut h = Harness::new(world);
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let result = net.next_hop_id(&id("P2"));
    assert!(matches!(result, Err(NodeError::NoRouteFound { .. })));
    let again = net.sink_distance(&id("P2"));
    assert!(matches!(again, Err(NodeError::NoRouteFound { .. })));

    let node = net.registry().peek(&id("P2")).unwrap();
    assert!(!node.downstream().is_resolved());
    assert_eq!(net.registry().resolutions(), 1);
}

#[test]
fn invalid_identifiers_register_nothing() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    assert!(matches!(net.node(&id("nope")), Err(NodeError::InvalidArgument { .. })));
    assert!(matches!(net.next_hop_id(&id("nope")), Err(NodeError::InvalidArgument { .. })));
    assert_eq!(net.registry().len(), 2);
}

#[test]
fn node_lookup_is_a_singleton() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let first = std::ptr::from_ref(net.node(&id("P1")).unwrap());
    let second = std::ptr::from_ref(net.node(&id("P1")).unwrap());
    assert!(std::ptr::eq(first, second));
    assert_eq!(net.registry().len(), 2);
}

#[test]
fn chained_distances_add_up() {
    let mut world = row_world(10, &["A", "B", "C"]);
    place(&mut world, "S", ObjectKind::Spawn, "A", 2, 5);
    place(&mut world, "relay", ObjectKind::Source, "B", 2, 5);
    place(&mut world, "far", ObjectKind::Source, "C", 5, 5);
    let mut h = Harness::new(world);
    h.registry
        .discover(&h.world, &mut h.store, &[RegionId::new("A"), RegionId::new("B"), RegionId::new("C")])
        .unwrap();

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    net.downstream(&id("relay")).unwrap();
    let far = net.downstream(&id("far")).unwrap();
    let hop_sink_distance = net.sink_distance(&far.next_hop_id).unwrap();

    assert_eq!(far.sink_id, id("S"));
    assert_eq!(far.sink_distance, far.next_hop_distance + hop_sink_distance);
    assert_eq!(far.next_hop_distance as usize, far.path.len());
}

#[test]
fn closer_sink_prunes_farther_route_searches() {
    let mut world = row_world(10, &["A", "B", "C", "D", "E"]);
    place(&mut world, "P", ObjectKind::Source, "A", 5, 5);
    place(&mut world, "S-far", ObjectKind::Spawn, "E", 5, 5);
    place(&mut world, "S-near", ObjectKind::Spawn, "B", 5, 5);
    place(&mut world, "S-mid", ObjectKind::Spawn, "C", 5, 5);
    let mut h = Harness::new(world);
    for raw in ["S-far", "S-near", "S-mid", "P"] {
        h.registry.get(&id(raw), &h.world, &mut h.store).unwrap();
    }

    let counting = CountingWorld::new(&h.world);
    let mut net = h.registry.session(&counting, &mut h.store, &mut h.queue, &h.config, 1);
    assert_eq!(net.sink_id(&id("P")).unwrap(), id("S-near"));
    // S-far is searched first, S-near improves on it, S-mid is never searched.
    assert_eq!(counting.route_searches(), 2);
}

#[test]
fn straight_line_bound_skips_hop_path_searches() {
    let mut world = row_world(10, &["A", "B"]);
    place(&mut world, "S", ObjectKind::Spawn, "B", 5, 5);
    place(&mut world, "q1", ObjectKind::Source, "A", 0, 0);
    place(&mut world, "q2", ObjectKind::Source, "A", 0, 9);
    place(&mut world, "P", ObjectKind::Source, "A", 0, 5);
    let mut h = Harness::new(world);
    for raw in ["S", "q1", "q2", "P"] {
        h.registry.get(&id(raw), &h.world, &mut h.store).unwrap();
    }

    let counting = CountingWorld::new(&h.world);
    let mut net = h.registry.session(&counting, &mut h.store, &mut h.queue, &h.config, 1);
    net.downstream(&id("q1")).unwrap();
    net.downstream(&id("q2")).unwrap();
    let sink_anchor = net.anchor_position(&id("S")).unwrap();

    let before = counting.path_searches();
    let downstream = net.downstream(&id("P")).unwrap();
    // Three candidates (S, q1, q2); only the sink is ever pathed to.
    assert_eq!(counting.path_searches() - before, 1);
    assert_eq!(downstream.next_hop_id, id("S"));

    let direct = h
        .world
        .find_path(&Position::new("A", 0, 5), &sink_anchor, h.config.path_options())
        .unwrap();
    assert_eq!(downstream.sink_distance as usize, direct.len());
}

// =============================================================================
// Caching and refresh
// =============================================================================

#[test]
fn repeated_reads_search_once() {
    let mut h = single_region();
    let counting = CountingWorld::new(&h.world);
    let mut net = h.registry.session(&counting, &mut h.store, &mut h.queue, &h.config, 1);

    net.next_hop_id(&id("P1")).unwrap();
    let searches = counting.path_searches();
    assert_eq!(searches, 1);

    net.next_hop_id(&id("P1")).unwrap();
    net.path(&id("P1")).unwrap();
    net.sink_distance(&id("P1")).unwrap();
    assert_eq!(counting.path_searches(), searches);
    assert_eq!(net.registry().resolutions(), 1);
}

#[test]
fn refresh_interval_boundary() {
    let mut h = single_region();
    h.registry
        .session(&h.world, &mut h.store, &mut h.queue, &h.config, 100)
        .next_hop_id(&id("P1"))
        .unwrap();
    assert_eq!(h.registry.resolutions(), 1);

    // Exactly one interval later: still fresh.
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 100 + 8640);
    assert_eq!(net.downstream(&id("P1")).unwrap().last_update_tick, 100);
    assert_eq!(net.registry().resolutions(), 1);

    // One tick past the interval: recomputed.
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 100 + 8641);
    assert_eq!(net.downstream(&id("P1")).unwrap().last_update_tick, 8741);
    assert_eq!(net.registry().resolutions(), 2);
}

#[test]
fn stale_record_is_recomputed() {
    let mut h = single_region();
    let record = NodeRecord {
        kind: NodeKind::Producer,
        origin: Position::new("W1N1", 2, 3),
        anchor: None,
        downstream: Some(Downstream {
            sink_id: id("S1"),
            next_hop_id: id("bogus"),
            next_hop_distance: 1,
            sink_distance: 1,
            path: vec![Position::new("W1N1", 3, 5)],
            last_update_tick: 0,
        }),
        collector_requested_at: None,
    };
    h.store.set_json("node:P9", &record).unwrap();

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 10_000);
    let downstream = net.downstream(&id("P9")).unwrap();
    assert_eq!(downstream.next_hop_id, id("S1"));
    assert_eq!(downstream.last_update_tick, 10_000);

    let stored: NodeRecord = h.store.get_json("node:P9").unwrap().unwrap();
    assert_eq!(stored.downstream.unwrap().last_update_tick, 10_000);
}

#[test]
fn fresh_persisted_group_is_adopted() {
    let mut h = single_region();
    // A second registry over the same store knows P1 but has resolved nothing.
    let mut other = omni_nodes::Registry::new();
    other.get(&id("P1"), &h.world, &mut h.store).unwrap();

    h.registry
        .session(&h.world, &mut h.store, &mut h.queue, &h.config, 5)
        .next_hop_id(&id("P1"))
        .unwrap();

    let counting = CountingWorld::new(&h.world);
    let mut net = other.session(&counting, &mut h.store, &mut h.queue, &h.config, 6);
    assert_eq!(net.next_hop_id(&id("P1")).unwrap(), id("S1"));
    assert_eq!(net.downstream(&id("P1")).unwrap().last_update_tick, 5);
    assert_eq!(counting.path_searches(), 0);
    assert_eq!(net.registry().resolutions(), 0);
}

#[test]
fn refresh_all_reports_each_producer() {
    let mut world = row_world(10, &["W1N1"]);
    place(&mut world, "S", ObjectKind::Spawn, "W1N1", 8, 8);
    place(&mut world, "a", ObjectKind::Source, "W1N1", 1, 1);
    place(&mut world, "b", ObjectKind::Source, "W1N1", 1, 8);
    world.add_region("island", (5, 5), 1).unwrap();
    place(&mut world, "lost", ObjectKind::Source, "island", 3, 3);
    let mut h = Harness::new(world);
    h.registry
        .discover(&h.world, &mut h.store, &[RegionId::new("W1N1"), RegionId::new("island")])
        .unwrap();

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    let first = net.refresh_all();
    assert_eq!((first.fresh, first.refreshed, first.failed), (0, 2, 1));

    let second = net.refresh_all();
    assert_eq!((second.fresh, second.refreshed, second.failed), (2, 0, 1));
}

#[test]
fn moved_next_hop_invalidates_routed_producers() {
    let mut world = row_world(10, &["A", "B", "C"]);
    place(&mut world, "S", ObjectKind::Spawn, "A", 2, 5);
    place(&mut world, "relay", ObjectKind::Source, "B", 2, 5);
    place(&mut world, "far", ObjectKind::Source, "C", 5, 5);
    let mut h = Harness::new(world);
    // relay precedes the sink, so it wins the tie for far's next hop.
    for raw in ["relay", "far", "S"] {
        h.registry.get(&id(raw), &h.world, &mut h.store).unwrap();
    }

    let relay_before = {
        let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
        let relay = net.downstream(&id("relay")).unwrap();
        let far = net.downstream(&id("far")).unwrap();
        assert_eq!(far.next_hop_id, id("relay"));
        assert_eq!(far.sink_distance, far.next_hop_distance + relay.sink_distance);
        relay.sink_distance
    };

    // Wall off the sink except through the bottom row.
    for y in 0..9 {
        h.world.add_wall(&Position::new("A", 4, y)).unwrap();
    }
    let relay_after = h
        .registry
        .session(&h.world, &mut h.store, &mut h.queue, &h.config, 1)
        .force_refresh(&id("relay"))
        .unwrap()
        .sink_distance;
    assert_ne!(relay_after, relay_before);

    assert!(!h.registry.peek(&id("far")).unwrap().downstream().is_resolved());
    let stored: NodeRecord = h.store.get_json("node:far").unwrap().unwrap();
    assert!(stored.downstream.is_none());

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    let far = net.downstream(&id("far")).unwrap();
    let hop_sink_distance = net.sink_distance(&far.next_hop_id).unwrap();
    assert_eq!(far.sink_distance, far.next_hop_distance + hop_sink_distance);
}

#[test]
fn forced_refresh_recomputes() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    net.downstream(&id("P1")).unwrap();
    let forced = net.force_refresh(&id("P1")).unwrap();
    assert_eq!(forced.next_hop_id, id("S1"));
    assert_eq!(net.registry().resolutions(), 2);
}

// =============================================================================
// Anchors and infrastructure
// =============================================================================

#[test]
fn missing_collector_is_requested_at_path_head() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let anchor = net.anchor(&id("P1")).unwrap();
    let head = net.path(&id("P1")).unwrap()[0].clone();
    assert_eq!(anchor.anchor_position, head);
    assert_eq!(anchor.source, AnchorSource::PathHead);
    net.anchor(&id("P1")).unwrap();

    assert_eq!(h.queue.count_of(StructureKind::Container), 1);
    assert_eq!(h.queue.requests()[0].pos, head);
}

#[test]
fn collector_request_is_not_repeated_within_interval() {
    let mut h = single_region();
    h.registry
        .session(&h.world, &mut h.store, &mut h.queue, &h.config, 1)
        .anchor(&id("P1"))
        .unwrap();
    h.queue.drain();

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 2);
    net.force_refresh(&id("P1")).unwrap();
    let anchor = net.anchor(&id("P1")).unwrap();
    assert_eq!(anchor.resolved_at, 2);
    assert!(h.queue.requests().is_empty());
}

#[test]
fn built_collector_becomes_anchor() {
    let mut h = single_region();
    place(&mut h.world, "box", ObjectKind::Container, "W1N1", 3, 6);
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let anchor = net.anchor(&id("P1")).unwrap();
    assert_eq!(anchor.anchor_position, Position::new("W1N1", 3, 6));
    assert_eq!(anchor.source, AnchorSource::Collector("box".into()));
    assert!(h.queue.requests().is_empty());
}

#[test]
fn pending_collector_uses_path_head() {
    let mut h = single_region();
    place(
        &mut h.world,
        "site",
        ObjectKind::ConstructionSite(StructureKind::Container),
        "W1N1",
        1,
        4,
    );
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let anchor = net.anchor(&id("P1")).unwrap();
    assert_eq!(anchor.source, AnchorSource::PendingCollector);
    assert_eq!(anchor.anchor_position, net.path(&id("P1")).unwrap()[0]);
    assert!(h.queue.requests().is_empty());
}

#[test]
fn roads_follow_the_path() {
    let mut h = single_region();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let outcome = net.ensure_infrastructure(&id("P1")).unwrap();
    let InfrastructureOutcome::Maintained { roads_requested, .. } = outcome else {
        panic!("producer should be maintained, got {outcome:?}");
    };
    assert_eq!(roads_requested, 4);
    assert_eq!(h.queue.count_of(StructureKind::Road), 4);
    assert_eq!(h.queue.count_of(StructureKind::Container), 1);
    assert!(matches!(
        h.registry
            .session(&h.world, &mut h.store, &mut h.queue, &h.config, 1)
            .ensure_infrastructure(&id("S1")),
        Ok(InfrastructureOutcome::NotApplicable)
    ));
}

#[test]
fn minerals_wait_for_region_level() {
    let mut h = single_region();
    place(&mut h.world, "M", ObjectKind::Mineral, "W1N1", 2, 2);
    h.world.set_region_level(&RegionId::new("W1N1"), 3).unwrap();
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    let outcome = net.ensure_infrastructure(&id("M")).unwrap();
    assert_eq!(outcome, InfrastructureOutcome::Gated { level: 3 });
    assert!(h.queue.requests().is_empty());
}

#[test]
fn gated_mineral_gets_no_collector_as_hop_candidate() {
    let mut world = row_world(10, &["A", "B", "C"]);
    place(&mut world, "S", ObjectKind::Spawn, "A", 2, 5);
    place(&mut world, "M", ObjectKind::Mineral, "B", 2, 5);
    place(&mut world, "far", ObjectKind::Source, "C", 5, 5);
    world.set_region_level(&RegionId::new("B"), 3).unwrap();
    let mut h = Harness::new(world);
    h.registry
        .discover(&h.world, &mut h.store, &[RegionId::new("A"), RegionId::new("B"), RegionId::new("C")])
        .unwrap();

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    let report = net.refresh_all();
    assert_eq!((report.refreshed, report.failed), (2, 0));
    assert_eq!(
        net.ensure_infrastructure(&id("M")).unwrap(),
        InfrastructureOutcome::Gated { level: 3 }
    );
    // Reading the anchor directly requests nothing either.
    net.anchor(&id("M")).unwrap();
    assert_eq!(h.queue.count_of(StructureKind::Container), 0);

    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);
    net.ensure_infrastructure(&id("far")).unwrap();
    assert_eq!(h.queue.count_of(StructureKind::Container), 1);
    assert_ne!(h.queue.requests()[0].pos.region, RegionId::new("B"));
}

#[test]
fn container_maps_to_its_source() {
    let mut h = single_region();
    place(&mut h.world, "box", ObjectKind::Container, "W1N1", 3, 6);
    place(
        &mut h.world,
        "hauler",
        ObjectKind::TransportUnit { assigned_node: None },
        "W1N1",
        5,
        5,
    );
    let mut net = h.registry.session(&h.world, &mut h.store, &mut h.queue, &h.config, 1);

    assert_eq!(net.node_for_object(&"box".into()).unwrap(), Some(id("P1")));
    assert_eq!(net.node_for_object(&"hauler".into()).unwrap(), None);
    assert!(matches!(
        net.node_for_object(&"missing".into()),
        Err(NodeError::InvalidArgument { .. })
    ));
}
