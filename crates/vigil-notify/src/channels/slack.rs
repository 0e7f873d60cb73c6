use async_trait::async_trait;
use serde_json::json;

use crate::channels::post_json;
use crate::error::NotifyError;
use crate::Notifier;
use vigil_common::channel::{ChannelConfig, ChannelType, NotificationChannel};
use vigil_common::types::{Alert, Severity};

/// Slack incoming-webhook delivery with attachment formatting.
pub struct SlackNotifier {
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn color(severity: Severity) -> &'static str {
        match severity {
            Severity::Info => "#439FE0",
            Severity::Warning => "warning",
            Severity::Critical => "danger",
        }
    }
}

impl Default for SlackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Slack
    }

    async fn send(
        &self,
        alert: &Alert,
        channel: &NotificationChannel,
    ) -> Result<(), NotifyError> {
        let ChannelConfig::Slack(cfg) = &channel.config else {
            return Err(NotifyError::InvalidConfig(format!(
                "channel '{}' does not carry a slack config",
                channel.name
            )));
        };

        let mut payload = json!({
            "text": format!("[{}] {}", alert.severity, alert.message),
            "attachments": [{
                "color": Self::color(alert.severity),
                "fields": [
                    { "title": "Host", "value": alert.host_id, "short": true },
                    { "title": "Metric", "value": alert.metric_name, "short": true },
                    { "title": "Value", "value": format!("{:.2}", alert.value), "short": true },
                    { "title": "Threshold", "value": format!("{:.2}", alert.threshold), "short": true },
                ],
                "ts": alert.triggered_at.timestamp(),
            }],
        });
        if let Some(ch) = &cfg.channel {
            payload["channel"] = json!(ch);
        }

        post_json(&self.client, &cfg.webhook_url, &payload).await
    }
}
