use async_trait::async_trait;
use serde_json::json;

use crate::channels::post_json;
use crate::error::NotifyError;
use crate::Notifier;
use vigil_common::channel::{ChannelConfig, ChannelType, NotificationChannel};
use vigil_common::types::Alert;

/// Generic JSON webhook delivery.
///
/// Without a `body_template` the full alert is posted as a JSON
/// document; with one, `{{placeholder}}` fields are substituted into
/// the template verbatim.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub(crate) fn render_body(alert: &Alert, template: Option<&str>) -> String {
        if let Some(template) = template {
            template
                .replace("{{alert_id}}", &alert.id)
                .replace("{{rule_id}}", &alert.rule_id)
                .replace("{{host_id}}", &alert.host_id)
                .replace("{{metric}}", &alert.metric_name)
                .replace("{{value}}", &format!("{:.2}", alert.value))
                .replace("{{threshold}}", &format!("{:.2}", alert.threshold))
                .replace("{{severity}}", &alert.severity.to_string())
                .replace("{{message}}", &alert.message)
                .replace("{{triggered_at}}", &alert.triggered_at.to_rfc3339())
        } else {
            json!({
                "alert_id": alert.id,
                "rule_id": alert.rule_id,
                "host_id": alert.host_id,
                "metric": alert.metric_name,
                "value": alert.value,
                "threshold": alert.threshold,
                "severity": alert.severity.to_string(),
                "message": alert.message,
                "triggered_at": alert.triggered_at.to_rfc3339(),
            })
            .to_string()
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Webhook
    }

    async fn send(
        &self,
        alert: &Alert,
        channel: &NotificationChannel,
    ) -> Result<(), NotifyError> {
        let ChannelConfig::Webhook(cfg) = &channel.config else {
            return Err(NotifyError::InvalidConfig(format!(
                "channel '{}' does not carry a webhook config",
                channel.name
            )));
        };

        let body = Self::render_body(alert, cfg.body_template.as_deref());
        let payload: serde_json::Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                return Err(NotifyError::InvalidConfig(format!(
                    "body_template does not render valid JSON: {e}"
                )))
            }
        };

        post_json(&self.client, &cfg.url, &payload).await
    }
}
