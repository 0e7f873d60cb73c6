use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Daemon configuration, loaded from a TOML file. Every field has a
/// default so a missing file or section still yields a runnable config.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_machine_id")]
    pub machine_id: i32,
    #[serde(default = "default_node_id")]
    pub node_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Snapshot file the external collection pipeline keeps current:
    /// one JSON array of latest samples, rewritten atomically.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "default_max_concurrent_rules")]
    pub max_concurrent_rules: usize,
    #[serde(default = "default_cycle_deadline_secs")]
    pub cycle_deadline_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_maintenance_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,
}

fn default_machine_id() -> i32 {
    1
}

fn default_node_id() -> i32 {
    1
}

fn default_database_url() -> String {
    "sqlite://data/vigil.db?mode=rwc".to_string()
}

fn default_snapshot_path() -> String {
    "data/metrics.json".to_string()
}

fn default_tick_secs() -> u64 {
    60
}

fn default_max_concurrent_rules() -> usize {
    8
}

fn default_cycle_deadline_secs() -> u64 {
    30
}

fn default_max_concurrent_sends() -> usize {
    16
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_maintenance_interval_secs() -> u64 {
    3600
}

fn default_stale_after_hours() -> u32 {
    24
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            machine_id: default_machine_id(),
            node_id: default_node_id(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            max_concurrent_rules: default_max_concurrent_rules(),
            cycle_deadline_secs: default_cycle_deadline_secs(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: default_max_concurrent_sends(),
            send_timeout_secs: default_send_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_maintenance_interval_secs(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}
