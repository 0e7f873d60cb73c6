use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;

use crate::entities::alert::{self, Column, Entity};
use crate::store::Store;
use vigil_common::types::{Alert, DeliveryStatus, Severity};

/// Filter for alert list queries.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub rule_id_eq: Option<String>,
    pub host_id_eq: Option<String>,
    pub severity_eq: Option<Severity>,
    pub triggered_after: Option<DateTime<Utc>>,
    pub triggered_before: Option<DateTime<Utc>>,
    pub active_only: bool,
}

/// Alert counts for a reporting window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertStatistics {
    pub total: u64,
    pub active: u64,
    pub by_severity: HashMap<String, u64>,
}

fn to_alert(m: alert::Model) -> Result<Alert> {
    Ok(Alert {
        id: m.id,
        rule_id: m.rule_id,
        host_id: m.host_id,
        metric_name: m.metric_name,
        value: m.value,
        threshold: m.threshold,
        severity: m.severity.parse().map_err(|e: String| anyhow!(e))?,
        message: m.message,
        triggered_at: m.triggered_at.with_timezone(&Utc),
        acknowledged_at: m.acknowledged_at.map(|t| t.with_timezone(&Utc)),
        acknowledged_by: m.acknowledged_by,
        resolved_at: m.resolved_at.map(|t| t.with_timezone(&Utc)),
        resolved_by: m.resolved_by,
        resolution_notes: m.resolution_notes,
        notification_status: serde_json::from_str(&m.notification_status)?,
    })
}

fn active_model(a: &Alert) -> Result<alert::ActiveModel> {
    Ok(alert::ActiveModel {
        id: Set(a.id.clone()),
        rule_id: Set(a.rule_id.clone()),
        host_id: Set(a.host_id.clone()),
        metric_name: Set(a.metric_name.clone()),
        value: Set(a.value),
        threshold: Set(a.threshold),
        severity: Set(a.severity.to_string()),
        message: Set(a.message.clone()),
        triggered_at: Set(a.triggered_at.fixed_offset()),
        acknowledged_at: Set(a.acknowledged_at.map(|t| t.fixed_offset())),
        acknowledged_by: Set(a.acknowledged_by.clone()),
        resolved_at: Set(a.resolved_at.map(|t| t.fixed_offset())),
        resolved_by: Set(a.resolved_by.clone()),
        resolution_notes: Set(a.resolution_notes.clone()),
        notification_status: Set(serde_json::to_string(&a.notification_status)?),
    })
}

fn apply_filter(
    mut q: sea_orm::Select<Entity>,
    filter: &AlertFilter,
) -> sea_orm::Select<Entity> {
    if let Some(ref v) = filter.rule_id_eq {
        q = q.filter(Column::RuleId.eq(v.as_str()));
    }
    if let Some(ref v) = filter.host_id_eq {
        q = q.filter(Column::HostId.eq(v.as_str()));
    }
    if let Some(sev) = filter.severity_eq {
        q = q.filter(Column::Severity.eq(sev.to_string()));
    }
    if let Some(after) = filter.triggered_after {
        q = q.filter(Column::TriggeredAt.gte(after.fixed_offset()));
    }
    if let Some(before) = filter.triggered_before {
        q = q.filter(Column::TriggeredAt.lte(before.fixed_offset()));
    }
    if filter.active_only {
        q = q.filter(Column::ResolvedAt.is_null());
    }
    q
}

impl Store {
    /// Insert the alert only if the (rule, host) cooldown window has
    /// elapsed since the most recent prior alert.
    ///
    /// The lookup and the insert run in one transaction so that two
    /// racing trigger attempts cannot both land inside the window.
    /// Returns `None` when suppressed.
    pub async fn insert_alert_if_cooldown_elapsed(
        &self,
        a: &Alert,
        cooldown_minutes: u32,
    ) -> Result<Option<Alert>> {
        let txn = self.db().begin().await?;

        if cooldown_minutes > 0 {
            let latest = Entity::find()
                .filter(Column::RuleId.eq(a.rule_id.as_str()))
                .filter(Column::HostId.eq(a.host_id.as_str()))
                .order_by(Column::TriggeredAt, Order::Desc)
                .one(&txn)
                .await?;
            if let Some(prev) = latest {
                let elapsed = a.triggered_at - prev.triggered_at.with_timezone(&Utc);
                if elapsed < Duration::minutes(i64::from(cooldown_minutes)) {
                    txn.rollback().await?;
                    return Ok(None);
                }
            }
        }

        let model = active_model(a)?.insert(&txn).await?;
        txn.commit().await?;
        Ok(Some(to_alert(model)?))
    }

    pub async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_alert).transpose()
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Alert>> {
        let rows = apply_filter(Entity::find(), filter)
            .order_by(Column::TriggeredAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_alert).collect()
    }

    pub async fn count_alerts(&self, filter: &AlertFilter) -> Result<u64> {
        Ok(apply_filter(Entity::find(), filter).count(self.db()).await?)
    }

    /// Most recent alert for a (rule, host) pair, regardless of state.
    pub async fn latest_alert_for(
        &self,
        rule_id: &str,
        host_id: &str,
    ) -> Result<Option<Alert>> {
        let model = Entity::find()
            .filter(Column::RuleId.eq(rule_id))
            .filter(Column::HostId.eq(host_id))
            .order_by(Column::TriggeredAt, Order::Desc)
            .one(self.db())
            .await?;
        model.map(to_alert).transpose()
    }

    pub async fn set_acknowledged(
        &self,
        id: &str,
        user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert::ActiveModel = m.into();
            am.acknowledged_at = Set(Some(at.fixed_offset()));
            am.acknowledged_by = Set(Some(user.to_string()));
            let updated = am.update(self.db()).await?;
            Ok(Some(to_alert(updated)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set_resolved(
        &self,
        id: &str,
        user: &str,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert::ActiveModel = m.into();
            am.resolved_at = Set(Some(at.fixed_offset()));
            am.resolved_by = Set(Some(user.to_string()));
            am.resolution_notes = Set(notes.map(|s| s.to_string()));
            let updated = am.update(self.db()).await?;
            Ok(Some(to_alert(updated)?))
        } else {
            Ok(None)
        }
    }

    /// Resolve every unresolved alert triggered before `cutoff`,
    /// attributing the resolution to `resolved_by`. Returns the number of
    /// alerts resolved; running it again resolves nothing extra.
    pub async fn resolve_alerts_older_than(
        &self,
        cutoff: DateTime<Utc>,
        resolved_by: &str,
    ) -> Result<u64> {
        let now = Utc::now().fixed_offset();
        let res = Entity::update_many()
            .col_expr(Column::ResolvedAt, Expr::value(Some(now)))
            .col_expr(Column::ResolvedBy, Expr::value(Some(resolved_by.to_string())))
            .filter(Column::ResolvedAt.is_null())
            .filter(Column::TriggeredAt.lt(cutoff.fixed_offset()))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }

    /// Record one channel's delivery outcome on the alert.
    ///
    /// Read-modify-write of the JSON map runs in a transaction so that
    /// concurrent per-channel completions stay last-writer-wins per key
    /// and never clobber each other's keys.
    pub async fn set_delivery_status(
        &self,
        alert_id: &str,
        channel_id: &str,
        status: DeliveryStatus,
    ) -> Result<()> {
        let txn = self.db().begin().await?;
        let Some(m) = Entity::find_by_id(alert_id).one(&txn).await? else {
            txn.rollback().await?;
            return Err(anyhow!("alert not found: {alert_id}"));
        };
        let mut map: HashMap<String, DeliveryStatus> =
            serde_json::from_str(&m.notification_status)?;
        map.insert(channel_id.to_string(), status);
        let mut am: alert::ActiveModel = m.into();
        am.notification_status = Set(serde_json::to_string(&map)?);
        am.update(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Alert counts since `since`, grouped by severity.
    pub async fn alert_statistics(&self, since: DateTime<Utc>) -> Result<AlertStatistics> {
        let base = Entity::find().filter(Column::TriggeredAt.gte(since.fixed_offset()));
        let total = base.clone().count(self.db()).await?;
        let active = base
            .clone()
            .filter(Column::ResolvedAt.is_null())
            .count(self.db())
            .await?;

        let mut by_severity = HashMap::new();
        for sev in [Severity::Info, Severity::Warning, Severity::Critical] {
            let count = base
                .clone()
                .filter(Column::Severity.eq(sev.to_string()))
                .count(self.db())
                .await?;
            by_severity.insert(sev.to_string(), count);
        }

        Ok(AlertStatistics {
            total,
            active,
            by_severity,
        })
    }
}
