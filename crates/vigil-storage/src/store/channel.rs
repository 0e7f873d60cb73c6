use anyhow::{anyhow, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
};

use crate::entities::notification_channel::{self, Column, Entity};
use crate::store::Store;
use vigil_common::channel::{ChannelConfig, ChannelType, NotificationChannel};

fn to_channel(m: notification_channel::Model) -> Result<NotificationChannel> {
    let channel_type: ChannelType = m.channel_type.parse().map_err(|e: String| anyhow!(e))?;
    let raw: serde_json::Value = serde_json::from_str(&m.config_json)?;
    let config = ChannelConfig::parse(channel_type, &raw)?;
    Ok(NotificationChannel {
        id: m.id,
        name: m.name,
        channel_type,
        config,
        min_severity: m.min_severity.parse().map_err(|e: String| anyhow!(e))?,
        enabled: m.enabled,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

impl Store {
    pub async fn insert_channel(&self, ch: &NotificationChannel) -> Result<NotificationChannel> {
        let now = Utc::now().fixed_offset();
        let am = notification_channel::ActiveModel {
            id: Set(ch.id.clone()),
            name: Set(ch.name.clone()),
            channel_type: Set(ch.channel_type.to_string()),
            config_json: Set(ch.config.to_raw().to_string()),
            min_severity: Set(ch.min_severity.to_string()),
            enabled: Set(ch.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        to_channel(model)
    }

    pub async fn get_channel(&self, id: &str) -> Result<Option<NotificationChannel>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_channel).transpose()
    }

    pub async fn get_channel_by_name(&self, name: &str) -> Result<Option<NotificationChannel>> {
        let model = Entity::find()
            .filter(Column::Name.eq(name))
            .one(self.db())
            .await?;
        model.map(to_channel).transpose()
    }

    pub async fn list_channels(
        &self,
        channel_type: Option<ChannelType>,
        enabled_only: bool,
    ) -> Result<Vec<NotificationChannel>> {
        let mut q = Entity::find();
        if let Some(ct) = channel_type {
            q = q.filter(Column::ChannelType.eq(ct.to_string()));
        }
        if enabled_only {
            q = q.filter(Column::Enabled.eq(true));
        }
        let rows = q.order_by(Column::CreatedAt, Order::Asc).all(self.db()).await?;
        rows.into_iter().map(to_channel).collect()
    }

    /// Resolve channel IDs to channel rows; IDs with no matching row are
    /// silently absent from the result (the caller logs them).
    pub async fn get_channels_by_ids(&self, ids: &[String]) -> Result<Vec<NotificationChannel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = Entity::find()
            .filter(Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_channel).collect()
    }

    pub async fn update_channel(
        &self,
        id: &str,
        ch: &NotificationChannel,
    ) -> Result<Option<NotificationChannel>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: notification_channel::ActiveModel = m.into();
            am.name = Set(ch.name.clone());
            am.channel_type = Set(ch.channel_type.to_string());
            am.config_json = Set(ch.config.to_raw().to_string());
            am.min_severity = Set(ch.min_severity.to_string());
            am.enabled = Set(ch.enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_channel(updated)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set_channel_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<NotificationChannel>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: notification_channel::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_channel(updated)?))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_channel(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }
}
