//! Notification routing and delivery for triggered alerts.
//!
//! A triggered alert is routed to its rule's configured channels
//! ([`router`]), then delivered to each channel concurrently by the
//! [`dispatcher::Dispatcher`] through the [`Notifier`] adapter matching
//! the channel type. Built-in notifiers cover email (SMTP), Slack,
//! Discord, and generic JSON webhooks.

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod router;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use vigil_common::channel::{ChannelType, NotificationChannel};
use vigil_common::types::Alert;

pub use error::NotifyError;

/// A delivery adapter for one channel type.
///
/// Implementations are stateless with respect to individual channels:
/// the channel row (with its validated config variant) is passed per
/// send. A config variant that does not match the notifier's type is a
/// permanent [`NotifyError::InvalidConfig`], never a panic.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The channel type this notifier serves.
    fn channel_type(&self) -> ChannelType;

    /// Delivers the alert through the given channel.
    ///
    /// One attempt only; the dispatcher owns the retry policy.
    async fn send(&self, alert: &Alert, channel: &NotificationChannel)
        -> Result<(), NotifyError>;
}

/// Plain-text summary used as the email body.
pub(crate) fn format_summary(alert: &Alert) -> String {
    format!(
        "Alert: {severity}\nHost: {host}\nMetric: {metric}\nValue: {value:.2}\nThreshold: {threshold:.2}\nMessage: {message}\nTriggered: {time}",
        severity = alert.severity,
        host = alert.host_id,
        metric = alert.metric_name,
        value = alert.value,
        threshold = alert.threshold,
        message = alert.message,
        time = alert.triggered_at.to_rfc3339(),
    )
}
