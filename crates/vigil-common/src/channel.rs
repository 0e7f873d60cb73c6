use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Severity;

/// Supported notification channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Email,
    Slack,
    Discord,
    Webhook,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Slack => write!(f, "slack"),
            ChannelType::Discord => write!(f, "discord"),
            ChannelType::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ChannelType::Email),
            "slack" => Ok(ChannelType::Slack),
            "discord" => Ok(ChannelType::Discord),
            "webhook" => Ok(ChannelType::Webhook),
            _ => Err(format!("unknown channel type: {s}")),
        }
    }
}

/// A channel config blob failed to parse against its type's schema.
#[derive(Debug, thiserror::Error)]
#[error("invalid {channel_type} channel config: {reason}")]
pub struct ChannelConfigError {
    pub channel_type: ChannelType,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
    /// Overrides the webhook's default channel when set (e.g. `#ops`).
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Optional body template; `{{value}}`-style placeholders are
    /// substituted at send time. Default is a JSON document of the alert.
    pub body_template: Option<String>,
}

/// Closed set of per-type channel configurations.
///
/// Replaces an open key/value map: each variant is validated by serde
/// against its required-field set when parsed, so a channel cannot be
/// persisted in a shape its notifier cannot send with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChannelConfig {
    Email(EmailConfig),
    Slack(SlackConfig),
    Discord(DiscordConfig),
    Webhook(WebhookConfig),
}

impl ChannelConfig {
    /// Parse and validate a raw JSON config blob for the given type.
    pub fn parse(channel_type: ChannelType, raw: &Value) -> Result<Self, ChannelConfigError> {
        let invalid = |e: serde_json::Error| ChannelConfigError {
            channel_type,
            reason: e.to_string(),
        };
        match channel_type {
            ChannelType::Email => {
                let cfg: EmailConfig = serde_json::from_value(raw.clone()).map_err(invalid)?;
                if cfg.to.is_empty() {
                    return Err(ChannelConfigError {
                        channel_type,
                        reason: "at least one recipient required in `to`".to_string(),
                    });
                }
                Ok(ChannelConfig::Email(cfg))
            }
            ChannelType::Slack => Ok(ChannelConfig::Slack(
                serde_json::from_value(raw.clone()).map_err(invalid)?,
            )),
            ChannelType::Discord => Ok(ChannelConfig::Discord(
                serde_json::from_value(raw.clone()).map_err(invalid)?,
            )),
            ChannelType::Webhook => Ok(ChannelConfig::Webhook(
                serde_json::from_value(raw.clone()).map_err(invalid)?,
            )),
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelConfig::Email(_) => ChannelType::Email,
            ChannelConfig::Slack(_) => ChannelType::Slack,
            ChannelConfig::Discord(_) => ChannelType::Discord,
            ChannelConfig::Webhook(_) => ChannelType::Webhook,
        }
    }

    /// Serialize back to the raw JSON shape accepted by [`Self::parse`].
    pub fn to_raw(&self) -> Value {
        match self {
            ChannelConfig::Email(c) => serde_json::to_value(c),
            ChannelConfig::Slack(c) => serde_json::to_value(c),
            ChannelConfig::Discord(c) => serde_json::to_value(c),
            ChannelConfig::Webhook(c) => serde_json::to_value(c),
        }
        .unwrap_or(Value::Null)
    }

    /// Raw JSON with secret-bearing fields replaced by `"***"`, for read
    /// paths that surface configs to operators.
    pub fn redacted(&self) -> Value {
        let mut raw = self.to_raw();
        if let Some(obj) = raw.as_object_mut() {
            for key in ["smtp_password", "webhook_url", "url"] {
                if obj.get(key).is_some_and(|v| !v.is_null()) {
                    obj.insert(key.to_string(), Value::String("***".to_string()));
                }
            }
        }
        raw
    }
}

/// A configured notification delivery target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub channel_type: ChannelType,
    pub config: ChannelConfig,
    /// Alerts below this severity are not routed to the channel.
    pub min_severity: Severity,
    pub enabled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
