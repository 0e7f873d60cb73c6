use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::NotifyError;
use crate::{format_summary, Notifier};
use vigil_common::channel::{ChannelConfig, ChannelType, EmailConfig, NotificationChannel};
use vigil_common::types::Alert;

/// SMTP delivery via lettre's async transport.
pub struct EmailNotifier;

impl EmailNotifier {
    fn transport(
        cfg: &EmailConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map_err(|e| NotifyError::InvalidConfig(format!("smtp_host: {e}")))?
            .port(cfg.smtp_port);

        if let (Some(user), Some(pass)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }

    fn subject(alert: &Alert) -> String {
        format!(
            "[vigil][{}] {} - {}",
            alert.severity, alert.metric_name, alert.host_id
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }

    async fn send(
        &self,
        alert: &Alert,
        channel: &NotificationChannel,
    ) -> Result<(), NotifyError> {
        let ChannelConfig::Email(cfg) = &channel.config else {
            return Err(NotifyError::InvalidConfig(format!(
                "channel '{}' does not carry an email config",
                channel.name
            )));
        };

        let transport = Self::transport(cfg)?;
        let subject = Self::subject(alert);
        let body = format_summary(alert);

        let from: lettre::message::Mailbox = cfg
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidConfig(format!("from address: {e}")))?;

        for recipient in &cfg.to {
            let to: lettre::message::Mailbox = recipient
                .parse()
                .map_err(|e| NotifyError::InvalidConfig(format!("to address: {e}")))?;
            let email = Message::builder()
                .from(from.clone())
                .to(to)
                .subject(subject.clone())
                .header(ContentType::TEXT_PLAIN)
                .body(body.clone())
                .map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

            transport
                .send(email)
                .await
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        }

        Ok(())
    }
}
