use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition as QueryCondition, EntityTrait,
    Order, QueryFilter, QueryOrder,
};

use crate::entities::alert_mute::{self, Column, Entity};
use crate::store::Store;
use vigil_common::types::AlertMute;

fn to_mute(m: alert_mute::Model) -> AlertMute {
    AlertMute {
        id: m.id,
        rule_id: m.rule_id,
        host_id: m.host_id,
        muted_by: m.muted_by,
        muted_at: m.muted_at.with_timezone(&Utc),
        expires_at: m.expires_at.map(|t| t.with_timezone(&Utc)),
        reason: m.reason,
    }
}

/// expires_at IS NULL OR expires_at > now
fn active_cond(now: DateTime<Utc>) -> QueryCondition {
    QueryCondition::any()
        .add(Column::ExpiresAt.is_null())
        .add(Column::ExpiresAt.gt(now.fixed_offset()))
}

impl Store {
    pub async fn insert_mute(&self, mute: &AlertMute) -> Result<AlertMute> {
        let am = alert_mute::ActiveModel {
            id: Set(mute.id.clone()),
            rule_id: Set(mute.rule_id.clone()),
            host_id: Set(mute.host_id.clone()),
            muted_by: Set(mute.muted_by.clone()),
            muted_at: Set(mute.muted_at.fixed_offset()),
            expires_at: Set(mute.expires_at.map(|t| t.fixed_offset())),
            reason: Set(mute.reason.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_mute(model))
    }

    pub async fn list_active_mutes(&self, now: DateTime<Utc>) -> Result<Vec<AlertMute>> {
        let rows = Entity::find()
            .filter(active_cond(now))
            .order_by(Column::MutedAt, Order::Desc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_mute).collect())
    }

    /// Active mutes covering a trigger of `rule_id` on `host_id`: either
    /// rule-wide mutes (host NULL) or mutes scoped to exactly that host.
    pub async fn active_mutes_covering(
        &self,
        rule_id: &str,
        host_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertMute>> {
        let scope = QueryCondition::any()
            .add(Column::HostId.is_null())
            .add(Column::HostId.eq(host_id));
        let rows = Entity::find()
            .filter(Column::RuleId.eq(rule_id))
            .filter(scope)
            .filter(active_cond(now))
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_mute).collect())
    }

    /// Remove every mute for the (rule, host) pair. `host_id = None`
    /// removes all of the rule's mutes regardless of scope.
    pub async fn delete_mutes_for(&self, rule_id: &str, host_id: Option<&str>) -> Result<u64> {
        let mut q = Entity::delete_many().filter(Column::RuleId.eq(rule_id));
        if let Some(h) = host_id {
            q = q.filter(Column::HostId.eq(h));
        }
        let res = q.exec(self.db()).await?;
        Ok(res.rows_affected)
    }

    /// Delete mutes whose expiry has passed. Idempotent; safe at any
    /// cadence since active-mute checks already compare expiry lazily.
    pub async fn cleanup_expired_mutes(&self, now: DateTime<Utc>) -> Result<u64> {
        let res = Entity::delete_many()
            .filter(Column::ExpiresAt.is_not_null())
            .filter(Column::ExpiresAt.lte(now.fixed_offset()))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }
}
