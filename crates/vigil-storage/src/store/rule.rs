use anyhow::{anyhow, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, Order, QueryFilter,
    QueryOrder, TransactionTrait,
};

use crate::entities::alert_rule::{self, Column, Entity};
use crate::entities::{alert, alert_mute};
use crate::store::Store;
use vigil_common::types::AlertRule;

fn to_rule(m: alert_rule::Model) -> Result<AlertRule> {
    Ok(AlertRule {
        id: m.id,
        name: m.name,
        rule_type: m.rule_type.parse().map_err(|e: String| anyhow!(e))?,
        metric_name: m.metric_name,
        host_id: m.host_id,
        condition: m.condition.parse().map_err(|e: String| anyhow!(e))?,
        threshold: m.threshold,
        severity: m.severity.parse().map_err(|e: String| anyhow!(e))?,
        enabled: m.enabled,
        notification_channel_ids: serde_json::from_str(&m.notification_channel_ids)?,
        cooldown_minutes: u32::try_from(m.cooldown_minutes.max(0))?,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

impl Store {
    pub async fn insert_rule(&self, rule: &AlertRule) -> Result<AlertRule> {
        let now = Utc::now().fixed_offset();
        let am = alert_rule::ActiveModel {
            id: Set(rule.id.clone()),
            name: Set(rule.name.clone()),
            rule_type: Set(rule.rule_type.to_string()),
            metric_name: Set(rule.metric_name.clone()),
            host_id: Set(rule.host_id.clone()),
            condition: Set(rule.condition.to_string()),
            threshold: Set(rule.threshold),
            severity: Set(rule.severity.to_string()),
            enabled: Set(rule.enabled),
            notification_channel_ids: Set(serde_json::to_string(
                &rule.notification_channel_ids,
            )?),
            cooldown_minutes: Set(i64::from(rule.cooldown_minutes)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        to_rule(model)
    }

    pub async fn get_rule(&self, id: &str) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_rule).transpose()
    }

    pub async fn get_rule_by_name(&self, name: &str) -> Result<Option<AlertRule>> {
        let model = Entity::find()
            .filter(Column::Name.eq(name))
            .one(self.db())
            .await?;
        model.map(to_rule).transpose()
    }

    pub async fn list_rules(&self, enabled_only: bool) -> Result<Vec<AlertRule>> {
        let mut q = Entity::find();
        if enabled_only {
            q = q.filter(Column::Enabled.eq(true));
        }
        let rows = q.order_by(Column::CreatedAt, Order::Asc).all(self.db()).await?;
        rows.into_iter().map(to_rule).collect()
    }

    /// Full-row update; `created_at` is preserved.
    pub async fn update_rule(&self, id: &str, rule: &AlertRule) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let now = Utc::now().fixed_offset();
            let mut am: alert_rule::ActiveModel = m.into();
            am.name = Set(rule.name.clone());
            am.rule_type = Set(rule.rule_type.to_string());
            am.metric_name = Set(rule.metric_name.clone());
            am.host_id = Set(rule.host_id.clone());
            am.condition = Set(rule.condition.to_string());
            am.threshold = Set(rule.threshold);
            am.severity = Set(rule.severity.to_string());
            am.enabled = Set(rule.enabled);
            am.notification_channel_ids =
                Set(serde_json::to_string(&rule.notification_channel_ids)?);
            am.cooldown_minutes = Set(i64::from(rule.cooldown_minutes));
            am.updated_at = Set(now);
            let updated = am.update(self.db()).await?;
            Ok(Some(to_rule(updated)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set_rule_enabled(&self, id: &str, enabled: bool) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert_rule::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_rule(updated)?))
        } else {
            Ok(None)
        }
    }

    /// Delete a rule together with its alerts and mutes.
    ///
    /// Cascading in one transaction keeps cooldown and mute lookups from
    /// ever matching rows of a deleted rule.
    pub async fn delete_rule_cascade(&self, id: &str) -> Result<bool> {
        let txn = self.db().begin().await?;
        let Some(model) = Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(false);
        };
        alert::Entity::delete_many()
            .filter(alert::Column::RuleId.eq(id))
            .exec(&txn)
            .await?;
        alert_mute::Entity::delete_many()
            .filter(alert_mute::Column::RuleId.eq(id))
            .exec(&txn)
            .await?;
        model.delete(&txn).await?;
        txn.commit().await?;
        Ok(true)
    }
}
