use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::registry::NotifierRegistry;
use crate::router::{self, SkipReason};
use crate::NotifyError;
use vigil_common::channel::NotificationChannel;
use vigil_common::types::{Alert, DeliveryStatus};
use vigil_storage::Store;

const MAX_ATTEMPTS: u32 = 3;

/// Fans one alert out to its channels concurrently, retrying transient
/// failures and recording the per-channel outcome on the alert row.
///
/// The dispatcher owns the whole retry policy: notifiers make a single
/// attempt each. Permanent failures (bad config, rejected payloads) are
/// not retried; transient ones back off exponentially between attempts.
pub struct Dispatcher {
    store: Arc<Store>,
    registry: Arc<NotifierRegistry>,
    limit: Arc<Semaphore>,
    send_timeout: Duration,
    base_backoff: Duration,
}

impl Dispatcher {
    pub fn new(
        store: Arc<Store>,
        registry: Arc<NotifierRegistry>,
        max_concurrent_sends: usize,
    ) -> Self {
        Self {
            store,
            registry,
            limit: Arc::new(Semaphore::new(max_concurrent_sends.max(1))),
            send_timeout: Duration::from_secs(10),
            base_backoff: Duration::from_millis(100),
        }
    }

    /// Overrides the per-attempt timeout and retry backoff base.
    pub fn with_timing(mut self, send_timeout: Duration, base_backoff: Duration) -> Self {
        self.send_timeout = send_timeout;
        self.base_backoff = base_backoff;
        self
    }

    /// Kicks off delivery of an alert to the given channel ids.
    ///
    /// Fire-and-forget from the caller's perspective: the returned
    /// handle resolves once every channel has a terminal delivery
    /// status, which tests and shutdown paths can await.
    pub fn dispatch(self: &Arc<Self>, alert: Alert, channel_ids: Vec<String>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(alert, channel_ids).await;
        })
    }

    async fn run(self: Arc<Self>, alert: Alert, channel_ids: Vec<String>) {
        if channel_ids.is_empty() {
            debug!(alert_id = %alert.id, "alert has no notification channels");
            return;
        }

        let channels = match self.store.get_channels_by_ids(&channel_ids).await {
            Ok(channels) => channels,
            Err(e) => {
                error!(alert_id = %alert.id, error = %e, "failed to load notification channels");
                return;
            }
        };

        for id in &channel_ids {
            if !channels.iter().any(|c| &c.id == id) {
                warn!(alert_id = %alert.id, channel_id = %id, "rule references missing channel");
            }
        }

        let plan = router::route(channels, alert.severity);

        for (channel_id, reason) in &plan.skipped {
            let why = match reason {
                SkipReason::Disabled => "channel disabled",
                SkipReason::BelowMinSeverity => "below channel min severity",
            };
            debug!(alert_id = %alert.id, channel_id = %channel_id, reason = why, "delivery skipped");
            self.record_status(&alert.id, channel_id, DeliveryStatus::Skipped)
                .await;
        }

        let mut handles = Vec::with_capacity(plan.targets.len());
        for channel in plan.targets {
            self.record_status(&alert.id, &channel.id, DeliveryStatus::Pending)
                .await;

            let this = Arc::clone(&self);
            let alert = alert.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match this.limit.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let status = this.deliver(&alert, &channel).await;
                this.record_status(&alert.id, &channel.id, status).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(alert_id = %alert.id, error = %e, "delivery task panicked");
            }
        }
    }

    /// Runs the attempt loop for one channel and returns the terminal status.
    async fn deliver(&self, alert: &Alert, channel: &NotificationChannel) -> DeliveryStatus {
        let Some(notifier) = self.registry.get(channel.channel_type) else {
            let e = NotifyError::UnknownChannelType(channel.channel_type);
            error!(
                channel_id = %channel.id,
                error = %e,
                "notification failed permanently"
            );
            return DeliveryStatus::Failed;
        };

        for attempt in 0..MAX_ATTEMPTS {
            let result = match timeout(self.send_timeout, notifier.send(alert, channel)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout(self.send_timeout)),
            };

            match result {
                Ok(()) => {
                    info!(
                        alert_id = %alert.id,
                        channel_id = %channel.id,
                        channel_type = %channel.channel_type,
                        attempt = attempt + 1,
                        "notification delivered"
                    );
                    return DeliveryStatus::Sent;
                }
                Err(e) if e.is_permanent() => {
                    error!(
                        alert_id = %alert.id,
                        channel_id = %channel.id,
                        channel_type = %channel.channel_type,
                        error = %e,
                        "notification failed permanently"
                    );
                    return DeliveryStatus::Failed;
                }
                Err(e) => {
                    warn!(
                        alert_id = %alert.id,
                        channel_id = %channel.id,
                        channel_type = %channel.channel_type,
                        attempt = attempt + 1,
                        error = %e,
                        "notification attempt failed"
                    );
                    if attempt + 1 < MAX_ATTEMPTS {
                        tokio::time::sleep(self.base_backoff * 2u32.pow(attempt)).await;
                    }
                }
            }
        }

        error!(
            alert_id = %alert.id,
            channel_id = %channel.id,
            channel_type = %channel.channel_type,
            attempts = MAX_ATTEMPTS,
            "notification failed after retries"
        );
        DeliveryStatus::Failed
    }

    async fn record_status(&self, alert_id: &str, channel_id: &str, status: DeliveryStatus) {
        if let Err(e) = self
            .store
            .set_delivery_status(alert_id, channel_id, status)
            .await
        {
            error!(
                alert_id = %alert_id,
                channel_id = %channel_id,
                error = %e,
                "failed to record delivery status"
            );
        }
    }
}
