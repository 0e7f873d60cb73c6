mod alert;
mod channel;
mod mute;
mod rule;

use std::sync::Arc;

use crate::error::{ManagerError, Result};
use vigil_alert::engine::{AlertEngine, CycleStats};
use vigil_common::channel::ChannelType;
use vigil_common::types::{Condition, RuleType, Severity};
use vigil_storage::Store;

pub(crate) const DEFAULT_LIST_LIMIT: usize = 500;

/// Input for creating or fully replacing a rule.
#[derive(Debug, Clone)]
pub struct RuleParams {
    pub name: String,
    pub rule_type: RuleType,
    pub metric_name: String,
    pub host_id: Option<String>,
    pub condition: Condition,
    pub threshold: f64,
    pub severity: Severity,
    pub enabled: bool,
    pub notification_channel_ids: Vec<String>,
    pub cooldown_minutes: u32,
}

/// Input for creating or fully replacing a notification channel.
#[derive(Debug, Clone)]
pub struct ChannelParams {
    pub name: String,
    pub channel_type: ChannelType,
    /// Raw config blob; validated against the type's schema before any
    /// write.
    pub config: serde_json::Value,
    pub min_severity: Severity,
    pub enabled: bool,
}

/// Facade over rule, alert, mute, and channel operations.
pub struct AlertManager {
    store: Arc<Store>,
    engine: AlertEngine,
}

impl AlertManager {
    pub fn new(store: Arc<Store>, engine: AlertEngine) -> Self {
        Self { store, engine }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    /// Runs one evaluation cycle on demand, outside the periodic tick.
    pub async fn evaluate_rules(&self) -> Result<CycleStats> {
        self.engine.run_cycle().await.map_err(ManagerError::from)
    }
}
