use chrono::{Duration, Utc};
use tracing::info;

use crate::error::{ManagerError, Result};
use crate::manager::AlertManager;
use vigil_common::id;
use vigil_common::types::AlertMute;

impl AlertManager {
    /// Suppresses a rule, for one host or rule-wide. Omitting the
    /// duration mutes indefinitely.
    pub async fn mute_rule(
        &self,
        rule_id: &str,
        host_id: Option<String>,
        muted_by: &str,
        duration_minutes: Option<u32>,
        reason: Option<String>,
    ) -> Result<AlertMute> {
        if muted_by.trim().is_empty() {
            return Err(ManagerError::Validation("muted_by must not be empty".into()));
        }
        if duration_minutes == Some(0) {
            return Err(ManagerError::Validation(
                "mute duration must be positive".into(),
            ));
        }
        self.get_rule(rule_id).await?;

        let now = Utc::now();
        let mute = AlertMute {
            id: id::next_id(),
            rule_id: rule_id.to_string(),
            host_id,
            muted_by: muted_by.to_string(),
            muted_at: now,
            expires_at: duration_minutes.map(|m| now + Duration::minutes(i64::from(m))),
            reason,
        };
        let created = self.store().insert_mute(&mute).await?;
        info!(
            rule_id = %rule_id,
            host_id = created.host_id.as_deref().unwrap_or("*"),
            muted_by = %muted_by,
            "rule muted"
        );
        Ok(created)
    }

    /// Removes mutes for the rule. With a host, only that host's mutes;
    /// without, every mute on the rule. Returns how many were removed.
    pub async fn unmute_rule(&self, rule_id: &str, host_id: Option<&str>) -> Result<u64> {
        self.get_rule(rule_id).await?;
        let removed = self.store().delete_mutes_for(rule_id, host_id).await?;
        info!(
            rule_id = %rule_id,
            host_id = host_id.unwrap_or("*"),
            count = removed,
            "rule unmuted"
        );
        Ok(removed)
    }

    pub async fn list_active_mutes(&self) -> Result<Vec<AlertMute>> {
        Ok(self.store().list_active_mutes(Utc::now()).await?)
    }

    /// Drops expired mute rows. Safe to run at any cadence.
    pub async fn cleanup_expired_mutes(&self) -> Result<u64> {
        Ok(self.store().cleanup_expired_mutes(Utc::now()).await?)
    }
}
