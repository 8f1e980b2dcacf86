//! Configuration loading and typed config structures for the node network.
//!
//! The canonical configuration lives in `omni-config.yaml` at the project
//! root. Every section and field is optional; omitted values fall back to
//! the defaults below.

use std::path::Path;

use omni_world::PathOptions;
use serde::Deserialize;

use crate::cache::{DEFAULT_REFRESH_INTERVAL, RefreshPolicy, TICK_SECONDS};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level node network configuration.
///
/// Mirrors the structure of `omni-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Cache expiry settings.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Path and anchor search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Collector and road upkeep settings.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Persistence location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.store.apply_env_overrides();
        Ok(config)
    }

    /// The refresh policy derived from the `refresh` section.
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::new(self.refresh.interval_ticks())
    }

    /// Search options for next-hop path searches.
    pub const fn path_options(&self) -> PathOptions {
        PathOptions {
            range: self.search.hop_range,
            max_ops: self.search.max_path_ops,
        }
    }
}

/// Cache expiry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    /// Simulated hours a cached group stays valid.
    #[serde(default = "default_refresh_hours")]
    pub refresh_hours: u64,

    /// Explicit interval in ticks. Overrides `refresh_hours` when set.
    #[serde(default)]
    pub interval_ticks: Option<u64>,
}

impl RefreshConfig {
    /// Effective refresh interval in ticks.
    pub fn interval_ticks(&self) -> u64 {
        if let Some(ticks) = self.interval_ticks {
            return ticks;
        }
        self.refresh_hours
            .checked_mul(3600)
            .and_then(|secs| secs.checked_div(self.tick_seconds))
            .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            refresh_hours: default_refresh_hours(),
            interval_ticks: None,
        }
    }
}

/// Path and anchor search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    /// How close a path must end to the next hop's anchor.
    #[serde(default = "default_hop_range")]
    pub hop_range: u32,

    /// Node expansion budget for one tile path search.
    #[serde(default = "default_max_path_ops")]
    pub max_path_ops: u32,

    /// Radius around a sink searched for a storage structure.
    #[serde(default = "default_storage_range")]
    pub storage_range: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hop_range: default_hop_range(),
            max_path_ops: default_max_path_ops(),
            storage_range: default_storage_range(),
        }
    }
}

/// Infrastructure upkeep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaintenanceConfig {
    /// Request roads along cached paths.
    #[serde(default = "default_true")]
    pub build_roads: bool,

    /// Minimum region level before mineral producers are maintained.
    #[serde(default = "default_mineral_min_level")]
    pub mineral_min_level: u32,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            build_roads: true,
            mineral_min_level: default_mineral_min_level(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON file backing the key-value store.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl StoreConfig {
    /// Override the store path with `OMNI_STORE_PATH` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OMNI_STORE_PATH") {
            self.path = val;
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_seconds() -> u64 {
    TICK_SECONDS
}

const fn default_refresh_hours() -> u64 {
    12
}

const fn default_hop_range() -> u32 {
    1
}

const fn default_max_path_ops() -> u32 {
    4000
}

const fn default_storage_range() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_mineral_min_level() -> u32 {
    6
}

fn default_store_path() -> String {
    "omni-store.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
