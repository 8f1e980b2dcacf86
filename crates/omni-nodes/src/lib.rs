//! Node network and path-caching engine for the Omni-Union logistics core.
//!
//! Producers (sources, minerals) route their output toward sinks (spawns).
//! This crate keeps the directory of routing nodes and lazily derives, caches
//! and periodically re-validates each node's anchor tile, downstream link and
//! path.
//!
//! # Tick usage
//!
//! ```text
//! Registry (owned by the orchestrator, lives for the process)
//!     |
//!     +-- registry.session(world, store, builder, config, tick) -> Network
//!             |-- node / node_for_object     (lookup, lazy creation)
//!             |-- anchor_position / next_hop_id / path / ...  (lazy caches)
//!             |-- refresh_all                (periodic re-validation)
//!             +-- ensure_infrastructure      (collector + road requests)
//! ```
//!
//! # Modules
//!
//! - [`anchor`] -- Collector, storage and fallback anchor selection.
//! - [`cache`] -- [`Cached`] groups and the [`RefreshPolicy`] TTL.
//! - [`config`] -- YAML configuration loading into [`NetworkConfig`].
//! - [`error`] -- [`NodeError`].
//! - [`node`] -- The [`Node`] entity and its persisted form.
//! - [`registry`] -- The [`Registry`] directory of live nodes.
//! - [`resolver`] -- Two-phase downstream search (sink, then next hop).
//! - [`network`] -- [`Network`], the per-tick session exposing lazy accessors.
//! - [`maintenance`] -- Collector and road upkeep along cached paths.
//!
//! [`Cached`]: cache::Cached
//! [`RefreshPolicy`]: cache::RefreshPolicy
//! [`NetworkConfig`]: config::NetworkConfig
//! [`NodeError`]: error::NodeError
//! [`Node`]: node::Node
//! [`Registry`]: registry::Registry
//! [`Network`]: network::Network

pub mod anchor;
pub mod cache;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod network;
pub mod node;
pub mod registry;
pub mod resolver;

pub use cache::{Cached, DEFAULT_REFRESH_INTERVAL, RefreshPolicy};
pub use config::NetworkConfig;
pub use error::NodeError;
pub use maintenance::InfrastructureOutcome;
pub use network::{Network, RefreshReport};
pub use node::Node;
pub use registry::Registry;
