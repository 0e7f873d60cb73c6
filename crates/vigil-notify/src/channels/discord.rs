use async_trait::async_trait;
use serde_json::json;

use crate::channels::post_json;
use crate::error::NotifyError;
use crate::Notifier;
use vigil_common::channel::{ChannelConfig, ChannelType, NotificationChannel};
use vigil_common::types::{Alert, Severity};

/// Discord webhook delivery with embed formatting.
pub struct DiscordNotifier {
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn color(severity: Severity) -> u32 {
        match severity {
            Severity::Info => 0x43_9F_E0,
            Severity::Warning => 0xFF_A5_00,
            Severity::Critical => 0xE0_1E_5A,
        }
    }
}

impl Default for DiscordNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Discord
    }

    async fn send(
        &self,
        alert: &Alert,
        channel: &NotificationChannel,
    ) -> Result<(), NotifyError> {
        let ChannelConfig::Discord(cfg) = &channel.config else {
            return Err(NotifyError::InvalidConfig(format!(
                "channel '{}' does not carry a discord config",
                channel.name
            )));
        };

        let mut payload = json!({
            "embeds": [{
                "title": format!("[{}] {}", alert.severity, alert.metric_name),
                "description": alert.message,
                "color": Self::color(alert.severity),
                "fields": [
                    { "name": "Host", "value": alert.host_id, "inline": true },
                    { "name": "Value", "value": format!("{:.2}", alert.value), "inline": true },
                    { "name": "Threshold", "value": format!("{:.2}", alert.threshold), "inline": true },
                ],
                "timestamp": alert.triggered_at.to_rfc3339(),
            }],
        });
        if let Some(name) = &cfg.username {
            payload["username"] = json!(name);
        }

        post_json(&self.client, &cfg.webhook_url, &payload).await
    }
}
