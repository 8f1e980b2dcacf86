//! Two-phase downstream search.
//!
//! Phase A picks the sink: the one whose region is fewest region
//! transitions away. Phase B picks the next hop: among the chosen sink and
//! producers already routed to it along the way, the one minimizing
//! `path length to it + its own distance to the sink`.
//!
//! Tile path searches are the expensive step. Both phases prune with cheap
//! lower bounds (region linear distance, straight-line tile distance) and
//! skip a candidate whenever its bound cannot beat the best found so far.
//! Ties keep the earlier candidate, so first-discovered order decides.
//!
//! Everything here reads the registry and world without mutating either.
//! Anchor resolution for candidates is the caller's job.

use std::collections::BTreeSet;

use omni_types::{NodeId, Position, RegionId};
use omni_world::{PathOptions, WorldQuery};
use tracing::debug;

use crate::cache::RefreshPolicy;
use crate::error::NodeError;
use crate::node::Node;
use crate::registry::Registry;

/// Outcome of phase A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkChoice {
    /// The selected sink.
    pub sink_id: NodeId,
    /// Regions entered on the way from the producer to the sink, ending
    /// with the sink's region. Empty when they share a region.
    pub route: Vec<RegionId>,
}

impl SinkChoice {
    /// Returns `true` if producer and sink share a region.
    pub fn is_local(&self) -> bool {
        self.route.is_empty()
    }
}

/// A phase B candidate with its anchor already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopCandidate {
    /// The candidate node.
    pub id: NodeId,
    /// Where a path to the candidate must end (within range).
    pub anchor: Position,
    /// The candidate's own distance to the sink (0 for the sink).
    pub sink_distance: u32,
}

/// Outcome of phase B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopChoice {
    /// The selected next hop.
    pub next_hop_id: NodeId,
    /// Tiles from the producer to the next hop, start excluded.
    pub path: Vec<Position>,
    /// `path.len()`.
    pub next_hop_distance: u32,
    /// `next_hop_distance` plus the next hop's own sink distance.
    pub sink_distance: u32,
}

/// Phase A: choose the sink with the shortest region route from `node`.
///
/// # Errors
///
/// Returns [`NodeError::NoRouteFound`] if no sink is registered or none is
/// reachable.
pub fn select_sink<W>(registry: &Registry, world: &W, node: &Node) -> Result<SinkChoice, NodeError>
where
    W: WorldQuery + ?Sized,
{
    let from = node.region();
    let mut best: Option<SinkChoice> = None;
    let mut best_len = u32::MAX;
    let mut sinks_seen = 0_u32;

    for sink in registry.sinks() {
        sinks_seen = sinks_seen.saturating_add(1);
        if best.is_some()
            && world
                .region_linear_distance(from, sink.region())
                .is_some_and(|bound| bound >= best_len)
        {
            debug!(node = %node.id(), sink = %sink.id(), "Sink pruned by region distance");
            continue;
        }

        match world.region_route(from, sink.region()) {
            Ok(route) => {
                let len = u32::try_from(route.len()).unwrap_or(u32::MAX);
                if len < best_len {
                    best_len = len;
                    best = Some(SinkChoice {
                        sink_id: sink.id().clone(),
                        route,
                    });
                }
            }
            Err(err) => debug!(node = %node.id(), sink = %sink.id(), %err, "Sink unreachable"),
        }
    }

    best.ok_or_else(|| {
        if sinks_seen == 0 {
            NodeError::no_route(node.id(), "no sink nodes registered")
        } else {
            NodeError::no_route(node.id(), "no sink reachable")
        }
    })
}

/// Phase B candidate set for `node`, with each candidate's sink distance.
///
/// Candidates live in the regions of `choice.route` or the node's own
/// region. The chosen sink always qualifies. A producer qualifies only if
/// its own downstream group is resolved and fresh, it feeds the same sink,
/// and its chain does not already pass through `node`. Producers are never
/// resolved recursively from here.
pub fn hop_candidates(
    registry: &Registry,
    node: &Node,
    choice: &SinkChoice,
    policy: RefreshPolicy,
    tick: u64,
) -> Vec<(NodeId, u32)> {
    if choice.is_local() {
        return vec![(choice.sink_id.clone(), 0)];
    }

    let regions: BTreeSet<&RegionId> = choice
        .route
        .iter()
        .chain(std::iter::once(node.region()))
        .collect();

    registry
        .iter()
        .filter(|other| other.id() != node.id() && regions.contains(other.region()))
        .filter_map(|other| {
            if other.is_sink() {
                return (other.id() == &choice.sink_id).then(|| (other.id().clone(), 0));
            }
            let downstream = other.downstream().as_resolved()?;
            let eligible = policy.is_fresh(downstream.last_update_tick, tick)
                && downstream.sink_id == choice.sink_id
                && !chain_contains(registry, other.id(), node.id());
            eligible.then(|| (other.id().clone(), downstream.sink_distance))
        })
        .collect()
}

/// Returns `true` if following next hops from `start` reaches `target`.
fn chain_contains(registry: &Registry, start: &NodeId, target: &NodeId) -> bool {
    let mut current = start;
    for _ in 0..registry.len() {
        let Some(next) = registry
            .peek(current)
            .and_then(|node| node.downstream().as_resolved())
            .map(|downstream| &downstream.next_hop_id)
        else {
            return false;
        };
        if next == target {
            return true;
        }
        current = next;
    }
    false
}

/// Phase B: choose the candidate minimizing total distance to the sink.
///
/// # Errors
///
/// Returns [`NodeError::NoRouteFound`] if no candidate can be pathed to.
pub fn select_next_hop<W>(
    world: &W,
    node_id: &NodeId,
    origin: &Position,
    candidates: &[HopCandidate],
    options: PathOptions,
) -> Result<HopChoice, NodeError>
where
    W: WorldQuery + ?Sized,
{
    let mut best: Option<HopChoice> = None;
    let mut best_total = u32::MAX;

    for candidate in candidates {
        let bound = world
            .tile_distance(origin, &candidate.anchor)
            .unwrap_or(0)
            .saturating_sub(options.range)
            .saturating_add(candidate.sink_distance);
        if best.is_some() && bound >= best_total {
            debug!(node = %node_id, candidate = %candidate.id, bound, best_total, "Next hop pruned");
            continue;
        }

        let path = match world.find_path(origin, &candidate.anchor, options) {
            Ok(path) => path,
            Err(err) => {
                debug!(node = %node_id, candidate = %candidate.id, %err, "Next hop unreachable");
                continue;
            }
        };
        let Ok(next_hop_distance) = u32::try_from(path.len()) else {
            continue;
        };
        let Some(total) = next_hop_distance.checked_add(candidate.sink_distance) else {
            continue;
        };
        if total < best_total {
            best_total = total;
            best = Some(HopChoice {
                next_hop_id: candidate.id.clone(),
                path,
                next_hop_distance,
                sink_distance: total,
            });
        }
    }

    best.ok_or_else(|| NodeError::no_route(node_id, "no reachable next hop"))
}
