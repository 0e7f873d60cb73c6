use chrono::Utc;
use tracing::info;

use crate::error::{ManagerError, Result};
use crate::manager::{AlertManager, ChannelParams};
use vigil_common::channel::{ChannelConfig, ChannelType, NotificationChannel};
use vigil_common::id;

impl AlertManager {
    pub async fn create_channel(&self, params: ChannelParams) -> Result<NotificationChannel> {
        if params.name.trim().is_empty() {
            return Err(ManagerError::Validation(
                "channel name must not be empty".into(),
            ));
        }
        if self
            .store()
            .get_channel_by_name(&params.name)
            .await?
            .is_some()
        {
            return Err(ManagerError::Validation(format!(
                "channel name already in use: {}",
                params.name
            )));
        }
        let config = ChannelConfig::parse(params.channel_type, &params.config)
            .map_err(|e| ManagerError::Validation(e.to_string()))?;

        let now = Utc::now();
        let channel = NotificationChannel {
            id: id::next_id(),
            name: params.name,
            channel_type: params.channel_type,
            config,
            min_severity: params.min_severity,
            enabled: params.enabled,
            created_at: now,
            updated_at: now,
        };
        let created = self.store().insert_channel(&channel).await?;
        info!(
            channel_id = %created.id,
            name = %created.name,
            channel_type = %created.channel_type,
            config = %created.config.redacted(),
            "notification channel created"
        );
        Ok(created)
    }

    pub async fn get_channel(&self, id: &str) -> Result<NotificationChannel> {
        self.store()
            .get_channel(id)
            .await?
            .ok_or_else(|| ManagerError::not_found("channel", id))
    }

    pub async fn list_channels(
        &self,
        channel_type: Option<ChannelType>,
        enabled_only: bool,
    ) -> Result<Vec<NotificationChannel>> {
        Ok(self.store().list_channels(channel_type, enabled_only).await?)
    }

    /// Full replacement of a channel's definition; the new config is
    /// validated against its type before anything is written.
    pub async fn update_channel(
        &self,
        id: &str,
        params: ChannelParams,
    ) -> Result<NotificationChannel> {
        if params.name.trim().is_empty() {
            return Err(ManagerError::Validation(
                "channel name must not be empty".into(),
            ));
        }
        let existing = self.get_channel(id).await?;
        if params.name != existing.name
            && self
                .store()
                .get_channel_by_name(&params.name)
                .await?
                .is_some()
        {
            return Err(ManagerError::Validation(format!(
                "channel name already in use: {}",
                params.name
            )));
        }
        let config = ChannelConfig::parse(params.channel_type, &params.config)
            .map_err(|e| ManagerError::Validation(e.to_string()))?;

        let channel = NotificationChannel {
            id: existing.id.clone(),
            name: params.name,
            channel_type: params.channel_type,
            config,
            min_severity: params.min_severity,
            enabled: params.enabled,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.store()
            .update_channel(id, &channel)
            .await?
            .ok_or_else(|| ManagerError::not_found("channel", id))
    }

    pub async fn enable_channel(&self, id: &str) -> Result<NotificationChannel> {
        self.store()
            .set_channel_enabled(id, true)
            .await?
            .ok_or_else(|| ManagerError::not_found("channel", id))
    }

    pub async fn disable_channel(&self, id: &str) -> Result<NotificationChannel> {
        self.store()
            .set_channel_enabled(id, false)
            .await?
            .ok_or_else(|| ManagerError::not_found("channel", id))
    }

    /// Deletes the channel row. Rules that still reference it keep their
    /// id list; dispatch logs the dangling reference and skips it.
    pub async fn delete_channel(&self, id: &str) -> Result<()> {
        if !self.store().delete_channel(id).await? {
            return Err(ManagerError::not_found("channel", id));
        }
        info!(channel_id = %id, "notification channel deleted");
        Ok(())
    }
}
