//! One tick of the headless engine.
//!
//! Each tick opens a [`Network`](omni_nodes::Network) session, re-validates
//! every producer, maintains their infrastructure, then lets the world
//! finish last tick's construction sites and place this tick's requests.
//! Sites therefore take exactly one tick to build.

use omni_nodes::{InfrastructureOutcome, NetworkConfig, NodeError, RefreshReport, Registry};
use omni_store::KeyValueStore;
use omni_world::{ConstructionQueue, GridWorld};
use tracing::{debug, info};

use crate::error::EngineError;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number.
    pub tick: u64,
    /// Downstream refresh counts.
    pub refresh: RefreshReport,
    /// Producers whose infrastructure was maintained.
    pub maintained: usize,
    /// Construction sites finished at the start of the tick.
    pub sites_completed: usize,
    /// Construction sites placed from this tick's requests.
    pub sites_placed: usize,
}

/// Run tick `tick` against `world`.
///
/// Unroutable producers are skipped; any other node failure aborts the tick.
pub fn run_tick<S: KeyValueStore>(
    registry: &mut Registry,
    world: &mut GridWorld,
    store: &mut S,
    config: &NetworkConfig,
    tick: u64,
) -> Result<TickSummary, EngineError> {
    let mut queue = ConstructionQueue::new();
    let mut maintained: usize = 0;

    let refresh = {
        let mut net = registry.session(&*world, store, &mut queue, config, tick);
        let refresh = net.refresh_all();
        for id in net.registry().producer_ids() {
            match net.ensure_infrastructure(&id) {
                Ok(InfrastructureOutcome::Maintained { .. }) => maintained = maintained.saturating_add(1),
                Ok(outcome) => debug!(tick, node = %id, ?outcome, "Infrastructure skipped"),
                Err(NodeError::NoRouteFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        refresh
    };

    let sites_completed = world.complete_sites();
    let sites_placed = world.place_sites(&queue.drain());

    let summary = TickSummary {
        tick,
        refresh,
        maintained,
        sites_completed,
        sites_placed,
    };
    if sites_completed > 0 || sites_placed > 0 {
        info!(tick, maintained, sites_completed, sites_placed, "Construction progressed");
    }
    Ok(summary)
}
