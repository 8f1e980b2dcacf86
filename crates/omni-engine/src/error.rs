//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: omni_nodes::config::ConfigError,
    },

    /// The `engine` section of the config file is malformed.
    #[error("engine config error: {message}")]
    EngineConfig {
        /// Description of the failure.
        message: String,
    },

    /// World construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: omni_world::WorldError,
    },

    /// The persistent store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: omni_store::StoreError,
    },

    /// A node lookup or resolution failed in a way that stops the tick.
    #[error("node error: {source}")]
    Node {
        /// The underlying node error.
        #[from]
        source: omni_nodes::NodeError,
    },
}
