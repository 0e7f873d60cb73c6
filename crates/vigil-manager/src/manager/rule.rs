use chrono::Utc;
use tracing::info;

use crate::error::{ManagerError, Result};
use crate::manager::{AlertManager, RuleParams};
use vigil_common::id;
use vigil_common::types::AlertRule;

fn validate(params: &RuleParams) -> Result<()> {
    if params.name.trim().is_empty() {
        return Err(ManagerError::Validation("rule name must not be empty".into()));
    }
    if params.metric_name.trim().is_empty() {
        return Err(ManagerError::Validation(
            "metric name must not be empty".into(),
        ));
    }
    if !params.threshold.is_finite() {
        return Err(ManagerError::Validation(
            "threshold must be a finite number".into(),
        ));
    }
    Ok(())
}

impl AlertManager {
    /// Fails when any referenced channel id has no matching channel row.
    async fn check_channels_exist(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store().get_channels_by_ids(ids).await?;
        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| !found.iter().any(|c| &c.id == *id))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::Validation(format!(
                "unknown notification channels: {}",
                missing.join(", ")
            )))
        }
    }

    pub async fn create_rule(&self, params: RuleParams) -> Result<AlertRule> {
        validate(&params)?;
        if self.store().get_rule_by_name(&params.name).await?.is_some() {
            return Err(ManagerError::Validation(format!(
                "rule name already in use: {}",
                params.name
            )));
        }
        self.check_channels_exist(&params.notification_channel_ids)
            .await?;

        let now = Utc::now();
        let rule = AlertRule {
            id: id::next_id(),
            name: params.name,
            rule_type: params.rule_type,
            metric_name: params.metric_name,
            host_id: params.host_id,
            condition: params.condition,
            threshold: params.threshold,
            severity: params.severity,
            enabled: params.enabled,
            notification_channel_ids: params.notification_channel_ids,
            cooldown_minutes: params.cooldown_minutes,
            created_at: now,
            updated_at: now,
        };
        let created = self.store().insert_rule(&rule).await?;
        info!(rule_id = %created.id, name = %created.name, "alert rule created");
        Ok(created)
    }

    pub async fn get_rule(&self, id: &str) -> Result<AlertRule> {
        self.store()
            .get_rule(id)
            .await?
            .ok_or_else(|| ManagerError::not_found("rule", id))
    }

    pub async fn list_rules(&self, enabled_only: bool) -> Result<Vec<AlertRule>> {
        Ok(self.store().list_rules(enabled_only).await?)
    }

    /// Full replacement of a rule's definition; `created_at` is kept.
    pub async fn update_rule(&self, id: &str, params: RuleParams) -> Result<AlertRule> {
        validate(&params)?;
        let existing = self.get_rule(id).await?;
        if params.name != existing.name
            && self.store().get_rule_by_name(&params.name).await?.is_some()
        {
            return Err(ManagerError::Validation(format!(
                "rule name already in use: {}",
                params.name
            )));
        }
        self.check_channels_exist(&params.notification_channel_ids)
            .await?;

        let rule = AlertRule {
            id: existing.id.clone(),
            name: params.name,
            rule_type: params.rule_type,
            metric_name: params.metric_name,
            host_id: params.host_id,
            condition: params.condition,
            threshold: params.threshold,
            severity: params.severity,
            enabled: params.enabled,
            notification_channel_ids: params.notification_channel_ids,
            cooldown_minutes: params.cooldown_minutes,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.store()
            .update_rule(id, &rule)
            .await?
            .ok_or_else(|| ManagerError::not_found("rule", id))
    }

    pub async fn enable_rule(&self, id: &str) -> Result<AlertRule> {
        self.store()
            .set_rule_enabled(id, true)
            .await?
            .ok_or_else(|| ManagerError::not_found("rule", id))
    }

    pub async fn disable_rule(&self, id: &str) -> Result<AlertRule> {
        self.store()
            .set_rule_enabled(id, false)
            .await?
            .ok_or_else(|| ManagerError::not_found("rule", id))
    }

    /// Deletes the rule together with its alert history and mutes.
    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        if !self.store().delete_rule_cascade(id).await? {
            return Err(ManagerError::not_found("rule", id));
        }
        info!(rule_id = %id, "alert rule deleted");
        Ok(())
    }
}
