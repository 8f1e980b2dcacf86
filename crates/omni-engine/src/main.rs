//! Headless engine for the Omni-Union logistics core.
//!
//! Wires the node network to the built-in starting world and runs it for a
//! fixed number of ticks, persisting node state between runs.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `omni-config.yaml` (or `OMNI_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting world
//! 4. Open the store and reload the registry
//! 5. Discover nodes in every region
//! 6. Run the tick loop, flushing the store periodically
//! 7. Log the result

mod error;
mod tick;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use omni_nodes::config::LoggingConfig;
use omni_nodes::{NetworkConfig, Registry};
use omni_store::{FileStore, KeyValueStore};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Store key holding the last completed tick.
const TICK_KEY: &str = "engine:tick";

/// Settings read from the `engine` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct EngineConfig {
    /// Ticks to run in this invocation.
    #[serde(default = "default_max_ticks")]
    max_ticks: u64,

    /// Flush the store every N ticks.
    #[serde(default = "default_flush_interval_ticks")]
    flush_interval_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            flush_interval_ticks: default_flush_interval_ticks(),
        }
    }
}

const fn default_max_ticks() -> u64 {
    100
}

const fn default_flush_interval_ticks() -> u64 {
    10
}

fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path).context("loading network configuration")?;
    let engine = load_engine_config(&config_path).context("loading engine configuration")?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        refresh_interval_ticks = config.refresh.interval_ticks(),
        max_ticks = engine.max_ticks,
        "omni-engine starting"
    );

    run(&config, &engine)?;
    Ok(())
}

/// Build the world, restore persisted state and run the tick loop.
fn run(config: &NetworkConfig, engine: &EngineConfig) -> Result<(), EngineError> {
    // 3. Create the starting world.
    let (mut world, ids) = omni_world::create_starting_world()?;
    info!(objects = world.object_count(), spawn = %ids.spawn, "Starting world created");

    // 4. Open the store and reload the registry.
    let mut store = FileStore::open(&config.store.path)?;
    let mut registry = Registry::load(&store)?;

    // 5. Discover nodes.
    let regions = world.region_ids();
    registry.discover(&world, &mut store, &regions)?;

    // 6. Run the tick loop.
    let first_tick = store
        .get_json::<u64>(TICK_KEY)?
        .map_or(1, |last| last.saturating_add(1));
    let flush_every = engine.flush_interval_ticks.max(1);
    let mut last_tick = first_tick.saturating_sub(1);

    for tick in first_tick..first_tick.saturating_add(engine.max_ticks) {
        let summary = tick::run_tick(&mut registry, &mut world, &mut store, config, tick)?;
        last_tick = summary.tick;
        if tick.checked_rem(flush_every) == Some(0) {
            debug!(tick, nodes_changed = store.is_dirty(), "Flushing store");
            store.set_json(TICK_KEY, &last_tick)?;
            store.flush()?;
        }
    }

    store.set_json(TICK_KEY, &last_tick)?;
    store.flush()?;

    // 7. Log the result.
    info!(
        first_tick,
        last_tick,
        nodes = registry.len(),
        resolutions = registry.resolutions(),
        store = %store.path().display(),
        "omni-engine shutdown complete"
    );
    Ok(())
}

/// Config file location: `OMNI_CONFIG` if set, else `omni-config.yaml`.
fn config_path() -> PathBuf {
    std::env::var_os("OMNI_CONFIG").map_or_else(|| PathBuf::from("omni-config.yaml"), PathBuf::from)
}

/// Load the network configuration, falling back to defaults if the file is
/// missing.
fn load_config(path: &Path) -> Result<NetworkConfig, EngineError> {
    if path.exists() {
        return Ok(NetworkConfig::from_file(path)?);
    }
    let mut config = NetworkConfig::default();
    config.store.apply_env_overrides();
    Ok(config)
}

/// Read the `engine` section of the config file, if present.
fn load_engine_config(path: &Path) -> Result<EngineConfig, EngineError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::EngineConfig {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::EngineConfig {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    raw.get("engine").map_or_else(
        || Ok(EngineConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::EngineConfig {
                message: format!("failed to parse engine config: {e}"),
            })
        },
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
