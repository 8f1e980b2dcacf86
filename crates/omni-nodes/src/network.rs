//! The per-tick network session and its lazy accessors.
//!
//! A [`Network`] borrows the [`Registry`] together with the world, the
//! store and the construction service for the duration of one tick. Every
//! accessor follows the same three-step lookup:
//!
//! 1. the in-memory group, if resolved and fresh;
//! 2. the persisted group, if present and fresh;
//! 3. recomputation, after which both copies are overwritten together.
//!
//! Staleness is judged against the session tick with [`RefreshPolicy`].
//! A failed downstream resolution is remembered for the rest of the tick so
//! repeated reads do not repeat the search. When a re-resolution moves a
//! node's sink or sink distance, every producer routed through it is
//! cleared so chained distances stay additive.

use omni_store::{KeyValueStore, node_key};
use omni_types::{Anchor, AnchorSource, Downstream, NodeId, NodeRecord, ObjectId, Position, StructureKind};
use omni_world::{ConstructionService, WorldQuery};
use tracing::{debug, info, warn};

use crate::anchor;
use crate::cache::RefreshPolicy;
use crate::config::NetworkConfig;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::Registry;
use crate::resolver::{self, HopCandidate};

/// Outcome of [`Network::refresh_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Producers whose downstream group was already fresh.
    pub fresh: usize,
    /// Producers that were re-resolved (or re-read from the store).
    pub refreshed: usize,
    /// Producers for which no route could be found.
    pub failed: usize,
}

/// One tick's view of the node network.
pub struct Network<'a, W: ?Sized, S, B: ?Sized> {
    registry: &'a mut Registry,
    world: &'a W,
    store: &'a mut S,
    builder: &'a mut B,
    config: &'a NetworkConfig,
    tick: u64,
}

impl<'a, W, S, B> Network<'a, W, S, B>
where
    W: WorldQuery + ?Sized,
    S: KeyValueStore,
    B: ConstructionService + ?Sized,
{
    /// Open a session at `tick`. See also [`Registry::session`].
    pub const fn new(
        registry: &'a mut Registry,
        world: &'a W,
        store: &'a mut S,
        builder: &'a mut B,
        config: &'a NetworkConfig,
        tick: u64,
    ) -> Self {
        Self {
            registry,
            world,
            store,
            builder,
            config,
            tick,
        }
    }

    /// The session tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    /// The configuration this session runs under.
    pub const fn config(&self) -> &NetworkConfig {
        self.config
    }

    pub(crate) const fn world(&self) -> &'a W {
        self.world
    }

    pub(crate) fn builder(&mut self) -> &mut B {
        &mut *self.builder
    }

    fn policy(&self) -> RefreshPolicy {
        self.config.refresh_policy()
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The node named `id`, created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidArgument`] if `id` is not a resource or
    /// spawn in the world and has no persisted record.
    pub fn node(&mut self, id: &NodeId) -> Result<&Node, NodeError> {
        self.registry.get(id, self.world, self.store)
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, NodeError> {
        self.registry.ensure(id, self.world, self.store)?;
        self.registry
            .peek_mut(id)
            .ok_or_else(|| NodeError::invalid(id.as_str(), "node vanished from registry"))
    }

    /// The node `object_id` is or belongs to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidArgument`] if the object no longer exists.
    pub fn node_for_object(&mut self, object_id: &ObjectId) -> Result<Option<NodeId>, NodeError> {
        self.registry.node_for_object(object_id, self.world, self.store)
    }

    // -----------------------------------------------------------------------
    // Anchor
    // -----------------------------------------------------------------------

    /// The tile transport units should target for node `id`.
    pub fn anchor_position(&mut self, id: &NodeId) -> Result<Position, NodeError> {
        self.anchor(id).map(|anchor| anchor.anchor_position)
    }

    /// The resolved anchor of node `id`, recomputed if missing or stale.
    ///
    /// Recomputing a producer's anchor may read (and so resolve) its
    /// downstream group, and may request a collector at the path head.
    pub fn anchor(&mut self, id: &NodeId) -> Result<Anchor, NodeError> {
        let world = self.world;
        let tick = self.tick;
        let policy = self.policy();

        let node = self.node_mut(id)?;
        if let Some(cached) = node.anchor().as_resolved() {
            if policy.is_fresh(cached.resolved_at, tick) && anchor::still_standing(world, cached) {
                return Ok(cached.clone());
            }
            debug!(node = %id, resolved_at = cached.resolved_at, tick, "Anchor expired");
            node.clear_anchor();
        }

        let persisted = self
            .persisted_record(id)?
            .and_then(|record| record.anchor)
            .filter(|persisted| policy.is_fresh(persisted.resolved_at, tick) && anchor::still_standing(world, persisted));
        if let Some(persisted) = persisted {
            self.node_mut(id)?.set_anchor(persisted.clone());
            return Ok(persisted);
        }

        let resolved = self.resolve_anchor(id)?;
        self.node_mut(id)?.set_anchor(resolved.clone());
        self.registry.persist(id, self.store)?;
        debug!(node = %id, anchor = %resolved.anchor_position, source = ?resolved.source, "Anchor resolved");
        Ok(resolved)
    }

    fn resolve_anchor(&mut self, id: &NodeId) -> Result<Anchor, NodeError> {
        let world = self.world;
        let tick = self.tick;
        let node = self.node(id)?;
        let origin = node.origin().clone();
        let is_sink = node.is_sink();
        if is_sink {
            return Ok(anchor::sink_anchor(world, &origin, self.config.search.storage_range, tick));
        }

        if let Some(collector) = anchor::find_collector(world, &origin) {
            return Ok(Anchor {
                anchor_position: collector.pos,
                source: AnchorSource::Collector(collector.id),
                resolved_at: tick,
            });
        }

        let downstream = self.downstream(id)?;
        let Some(head) = downstream.path.first().cloned() else {
            // Already beside the next hop: share its anchor.
            let shared = self.anchor_position(&downstream.next_hop_id)?;
            return Ok(Anchor {
                anchor_position: shared,
                source: AnchorSource::PathHead,
                resolved_at: tick,
            });
        };

        if anchor::has_pending_collector(world, &origin) {
            return Ok(Anchor {
                anchor_position: head,
                source: AnchorSource::PendingCollector,
                resolved_at: tick,
            });
        }

        self.request_collector(id, &head)?;
        Ok(Anchor {
            anchor_position: head,
            source: AnchorSource::PathHead,
            resolved_at: tick,
        })
    }

    /// Ask for a collector at `head` unless one was requested within the
    /// refresh interval.
    fn request_collector(&mut self, id: &NodeId, head: &Position) -> Result<(), NodeError> {
        let tick = self.tick;
        let policy = self.policy();
        let region = self.node(id)?.region().clone();
        if let Some(level) = self.mineral_gate(id, &region) {
            debug!(tick, node = %id, level, "Collector withheld below mineral level");
            return Ok(());
        }
        let recently = self
            .node(id)?
            .collector_requested_at()
            .is_some_and(|at| policy.is_fresh(at, tick));
        if recently {
            return Ok(());
        }

        match self.builder.request(head, StructureKind::Container) {
            Ok(()) => {
                info!(tick, node = %id, %head, "Collector placement requested");
                self.node_mut(id)?.note_collector_request(tick);
            }
            Err(err) => warn!(tick, node = %id, %head, %err, "Collector placement rejected"),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Downstream
    // -----------------------------------------------------------------------

    /// The downstream group of node `id`, recomputed if missing or stale.
    ///
    /// Sinks always report themselves at distance 0 with an empty path.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NoRouteFound`] if no sink is reachable. The
    /// node's downstream group then stays unresolved.
    pub fn downstream(&mut self, id: &NodeId) -> Result<Downstream, NodeError> {
        let tick = self.tick;
        let policy = self.policy();

        let node = self.node_mut(id)?;
        if node.is_sink() {
            return Ok(terminal(id, tick));
        }
        if let Some(cached) = node.downstream().as_resolved() {
            if policy.is_fresh(cached.last_update_tick, tick) {
                return Ok(cached.clone());
            }
            debug!(node = %id, resolved_at = cached.last_update_tick, tick, "Downstream expired");
            node.clear_downstream();
        }
        if node.failed_at_tick(tick) {
            return Err(NodeError::no_route(id, "resolution already failed this tick"));
        }

        match self.persisted_downstream(id) {
            Ok(persisted) => {
                self.node_mut(id)?.set_downstream(persisted.clone());
                return Ok(persisted);
            }
            Err(NodeError::StaleData(_)) => {}
            Err(err) => return Err(err),
        }

        self.recompute_downstream(id)
    }

    /// Discard node `id`'s downstream group and resolve it again now,
    /// ignoring both cached copies.
    ///
    /// If the sink or sink distance changes, producers routed through `id`
    /// lose their downstream group and re-resolve on their next read.
    pub fn force_refresh(&mut self, id: &NodeId) -> Result<Downstream, NodeError> {
        let tick = self.tick;
        let node = self.node_mut(id)?;
        if node.is_sink() {
            return Ok(terminal(id, tick));
        }
        node.clear_downstream();
        self.recompute_downstream(id)
    }

    fn persisted_record(&self, id: &NodeId) -> Result<Option<NodeRecord>, NodeError> {
        Ok(self.store.get_json::<NodeRecord>(&node_key(id.as_str()))?)
    }

    /// The persisted downstream group, or [`NodeError::StaleData`] if it is
    /// absent or expired.
    fn persisted_downstream(&self, id: &NodeId) -> Result<Downstream, NodeError> {
        let policy = self.policy();
        self.persisted_record(id)?
            .and_then(|record| record.downstream)
            .filter(|downstream| policy.is_fresh(downstream.last_update_tick, self.tick))
            .ok_or_else(|| NodeError::StaleData(id.clone()))
    }

    fn recompute_downstream(&mut self, id: &NodeId) -> Result<Downstream, NodeError> {
        let tick = self.tick;
        let previous = self.persisted_record(id)?.and_then(|record| record.downstream);
        match self.resolve_downstream(id) {
            Ok(downstream) => {
                self.node_mut(id)?.set_downstream(downstream.clone());
                self.registry.persist(id, self.store)?;
                info!(
                    tick,
                    node = %id,
                    sink = %downstream.sink_id,
                    next_hop = %downstream.next_hop_id,
                    next_hop_distance = downstream.next_hop_distance,
                    sink_distance = downstream.sink_distance,
                    "Downstream resolved"
                );
                let moved = previous.is_some_and(|old| {
                    old.sink_id != downstream.sink_id || old.sink_distance != downstream.sink_distance
                });
                if moved {
                    self.invalidate_dependents(id)?;
                }
                Ok(downstream)
            }
            Err(err) => {
                self.node_mut(id)?.mark_failed(tick);
                self.registry.persist(id, self.store)?;
                if previous.is_some() {
                    self.invalidate_dependents(id)?;
                }
                Err(err)
            }
        }
    }

    /// Clear the downstream group of every producer whose chain passes
    /// through `id`, in memory and in the store.
    fn invalidate_dependents(&mut self, id: &NodeId) -> Result<(), NodeError> {
        let tick = self.tick;
        let mut pending = vec![id.clone()];
        while let Some(upstream) = pending.pop() {
            for dependent in self.registry.routed_through(&upstream) {
                if let Some(node) = self.registry.peek_mut(&dependent) {
                    node.clear_downstream();
                }
                self.registry.persist(&dependent, self.store)?;
                debug!(tick, node = %dependent, via = %upstream, "Downstream invalidated");
                pending.push(dependent);
            }
        }
        Ok(())
    }

    fn resolve_downstream(&mut self, id: &NodeId) -> Result<Downstream, NodeError> {
        self.registry.note_resolution();
        let tick = self.tick;

        let (choice, ids, origin) = {
            let registry: &Registry = &*self.registry;
            let node = registry
                .peek(id)
                .ok_or_else(|| NodeError::invalid(id.as_str(), "node vanished from registry"))?;
            let choice = resolver::select_sink(registry, self.world, node)?;
            let ids = resolver::hop_candidates(registry, node, &choice, self.policy(), tick);
            (choice, ids, node.origin().clone())
        };

        let mut candidates = Vec::with_capacity(ids.len());
        for (candidate, sink_distance) in ids {
            match self.candidate_anchor(&candidate) {
                Ok(anchor) => candidates.push(HopCandidate {
                    id: candidate,
                    anchor,
                    sink_distance,
                }),
                Err(err) => debug!(node = %id, %candidate, %err, "Candidate has no anchor"),
            }
        }

        let hop = resolver::select_next_hop(self.world, id, &origin, &candidates, self.config.path_options())?;
        Ok(Downstream {
            sink_id: choice.sink_id,
            next_hop_id: hop.next_hop_id,
            next_hop_distance: hop.next_hop_distance,
            sink_distance: hop.sink_distance,
            path: hop.path,
            last_update_tick: tick,
        })
    }

    /// Where a path to hop candidate `id` must end, read without requesting
    /// any construction. A producer with no fresh anchor falls back to its
    /// collector, then to the head of its own path.
    fn candidate_anchor(&mut self, id: &NodeId) -> Result<Position, NodeError> {
        let world = self.world;
        let tick = self.tick;
        let policy = self.policy();
        let mut current = id.clone();

        for _ in 0..=self.registry.len() {
            let node = self.node(&current)?;
            if node.is_sink() {
                return self.anchor_position(&current);
            }
            let cached = node
                .anchor()
                .as_resolved()
                .filter(|cached| policy.is_fresh(cached.resolved_at, tick) && anchor::still_standing(world, cached));
            if let Some(cached) = cached {
                return Ok(cached.anchor_position.clone());
            }
            if let Some(collector) = anchor::find_collector(world, node.origin()) {
                return Ok(collector.pos);
            }
            let Some(downstream) = node.downstream().as_resolved() else {
                return Err(NodeError::StaleData(current));
            };
            match downstream.path.first() {
                Some(head) => return Ok(head.clone()),
                None => current = downstream.next_hop_id.clone(),
            }
        }
        Err(NodeError::no_route(id, "anchor chain does not end at a sink"))
    }

    /// Id of the sink node `id` ultimately feeds. A sink's is itself.
    pub fn sink_id(&mut self, id: &NodeId) -> Result<NodeId, NodeError> {
        self.downstream(id).map(|downstream| downstream.sink_id)
    }

    /// The sink node `id` ultimately feeds.
    pub fn sink_node(&mut self, id: &NodeId) -> Result<&Node, NodeError> {
        let sink = self.sink_id(id)?;
        self.node(&sink)
    }

    /// Id of the node one hop downstream of `id`. A sink's is itself.
    pub fn next_hop_id(&mut self, id: &NodeId) -> Result<NodeId, NodeError> {
        self.downstream(id).map(|downstream| downstream.next_hop_id)
    }

    /// The node one hop downstream of `id`.
    pub fn next_hop(&mut self, id: &NodeId) -> Result<&Node, NodeError> {
        let next = self.next_hop_id(id)?;
        self.node(&next)
    }

    /// Path length in tiles from `id` to its next hop.
    pub fn next_hop_distance(&mut self, id: &NodeId) -> Result<u32, NodeError> {
        self.downstream(id).map(|downstream| downstream.next_hop_distance)
    }

    /// Total path length in tiles from `id` to its sink.
    pub fn sink_distance(&mut self, id: &NodeId) -> Result<u32, NodeError> {
        self.downstream(id).map(|downstream| downstream.sink_distance)
    }

    /// Tiles from `id` to its next hop, start tile excluded.
    pub fn path(&mut self, id: &NodeId) -> Result<Vec<Position>, NodeError> {
        self.downstream(id).map(|downstream| downstream.path)
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Re-validate every producer's downstream group.
    ///
    /// Fresh groups are left alone. Failures are logged and counted; one
    /// unroutable producer never stops the others.
    pub fn refresh_all(&mut self) -> RefreshReport {
        let tick = self.tick;
        let policy = self.policy();
        let mut report = RefreshReport::default();

        for id in self.registry.producer_ids() {
            let fresh = self
                .registry
                .peek(&id)
                .and_then(|node| node.downstream().as_resolved())
                .is_some_and(|downstream| policy.is_fresh(downstream.last_update_tick, tick));
            if fresh {
                report.fresh = report.fresh.saturating_add(1);
                continue;
            }

            match self.downstream(&id) {
                Ok(_) => report.refreshed = report.refreshed.saturating_add(1),
                Err(err) => {
                    warn!(tick, node = %id, %err, "Downstream refresh failed");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        if report.refreshed > 0 || report.failed > 0 {
            info!(tick, fresh = report.fresh, refreshed = report.refreshed, failed = report.failed, "Network refreshed");
        }
        report
    }
}

/// The constant downstream view of a sink.
fn terminal(id: &NodeId, tick: u64) -> Downstream {
    Downstream {
        sink_id: id.clone(),
        next_hop_id: id.clone(),
        next_hop_distance: 0,
        sink_distance: 0,
        path: Vec::new(),
        last_update_tick: tick,
    }
}
