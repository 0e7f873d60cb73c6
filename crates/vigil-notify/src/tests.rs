use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::channels::webhook::WebhookNotifier;
use crate::dispatcher::Dispatcher;
use crate::registry::NotifierRegistry;
use crate::router::{self, SkipReason};
use crate::{NotifyError, Notifier};
use vigil_common::channel::{
    ChannelConfig, ChannelType, NotificationChannel, WebhookConfig,
};
use vigil_common::types::{Alert, DeliveryStatus, Severity};
use vigil_storage::Store;

fn channel(id: &str, min_severity: Severity, enabled: bool) -> NotificationChannel {
    let now = Utc::now();
    NotificationChannel {
        id: id.to_string(),
        name: format!("channel-{id}"),
        channel_type: ChannelType::Webhook,
        config: ChannelConfig::Webhook(WebhookConfig {
            url: "http://127.0.0.1:1/hook".to_string(),
            body_template: None,
        }),
        min_severity,
        enabled,
        created_at: now,
        updated_at: now,
    }
}

fn alert(id: &str, severity: Severity) -> Alert {
    Alert {
        id: id.to_string(),
        rule_id: "rule-1".to_string(),
        host_id: "host-1".to_string(),
        metric_name: "cpu_usage".to_string(),
        value: 97.5,
        threshold: 90.0,
        severity,
        message: "cpu_usage is above 90.00 (current: 97.50)".to_string(),
        triggered_at: Utc::now(),
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        resolved_by: None,
        resolution_notes: None,
        notification_status: HashMap::new(),
    }
}

#[test]
fn router_filters_by_min_severity() {
    let channels = vec![
        channel("info", Severity::Info, true),
        channel("warn", Severity::Warning, true),
        channel("crit", Severity::Critical, true),
    ];
    let plan = router::route(channels, Severity::Warning);

    let target_ids: Vec<_> = plan.targets.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(target_ids, vec!["info", "warn"]);
    assert_eq!(
        plan.skipped,
        vec![("crit".to_string(), SkipReason::BelowMinSeverity)]
    );
}

#[test]
fn router_skips_disabled_channels() {
    let channels = vec![
        channel("on", Severity::Info, true),
        channel("off", Severity::Info, false),
    ];
    let plan = router::route(channels, Severity::Critical);

    assert_eq!(plan.targets.len(), 1);
    assert_eq!(plan.targets[0].id, "on");
    assert_eq!(plan.skipped, vec![("off".to_string(), SkipReason::Disabled)]);
}

#[test]
fn router_critical_reaches_everything_enabled() {
    let channels = vec![
        channel("a", Severity::Info, true),
        channel("b", Severity::Critical, true),
    ];
    let plan = router::route(channels, Severity::Critical);
    assert_eq!(plan.targets.len(), 2);
    assert!(plan.skipped.is_empty());
}

#[test]
fn webhook_template_substitutes_placeholders() {
    let a = alert("al-1", Severity::Critical);
    let body = WebhookNotifier::render_body(
        &a,
        Some(r#"{"text":"{{severity}}: {{metric}} on {{host_id}} = {{value}}"}"#),
    );
    assert_eq!(
        body,
        r#"{"text":"critical: cpu_usage on host-1 = 97.50"}"#
    );
}

#[test]
fn webhook_default_body_is_full_alert_json() {
    let a = alert("al-2", Severity::Warning);
    let body = WebhookNotifier::render_body(&a, None);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["alert_id"], "al-2");
    assert_eq!(v["severity"], "warning");
    assert_eq!(v["threshold"], 90.0);
}

#[test]
fn permanent_errors_are_classified() {
    assert!(NotifyError::InvalidConfig("x".to_string()).is_permanent());
    assert!(NotifyError::Endpoint {
        status: 404,
        body: String::new()
    }
    .is_permanent());
    assert!(!NotifyError::Endpoint {
        status: 429,
        body: String::new()
    }
    .is_permanent());
    assert!(!NotifyError::Endpoint {
        status: 503,
        body: String::new()
    }
    .is_permanent());
    assert!(!NotifyError::Smtp("x".to_string()).is_permanent());
    assert!(!NotifyError::Timeout(Duration::from_secs(1)).is_permanent());
}

#[test]
fn builtin_registry_covers_all_channel_types() {
    let registry = NotifierRegistry::builtin();
    for ct in [
        ChannelType::Email,
        ChannelType::Slack,
        ChannelType::Discord,
        ChannelType::Webhook,
    ] {
        assert!(registry.get(ct).is_some(), "missing notifier for {ct}");
    }
}

enum Script {
    Ok,
    PermanentFailFor(&'static str),
    TransientFailures(u32),
    StallFor(u32),
}

/// Test double standing in for the webhook notifier.
struct ScriptedNotifier {
    script: Script,
    attempts: AtomicU32,
}

impl ScriptedNotifier {
    fn new(script: Script) -> Self {
        Self {
            script,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Webhook
    }

    async fn send(
        &self,
        _alert: &Alert,
        channel: &NotificationChannel,
    ) -> Result<(), NotifyError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Ok => Ok(()),
            Script::PermanentFailFor(id) => {
                if channel.id == *id {
                    Err(NotifyError::Endpoint {
                        status: 404,
                        body: "no such hook".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            Script::TransientFailures(count) => {
                if n < *count {
                    Err(NotifyError::Endpoint {
                        status: 503,
                        body: "try later".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            Script::StallFor(count) => {
                if n < *count {
                    std::future::pending().await
                } else {
                    Ok(())
                }
            }
        }
    }
}

async fn dispatch_harness(
    notifier: Arc<ScriptedNotifier>,
    channels: &[NotificationChannel],
    a: &Alert,
) -> (Arc<Store>, Alert) {
    let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
    for ch in channels {
        store.insert_channel(ch).await.unwrap();
    }
    let stored = store
        .insert_alert_if_cooldown_elapsed(a, 0)
        .await
        .unwrap()
        .unwrap();

    let mut registry = NotifierRegistry::new();
    registry.register(notifier);

    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&store), Arc::new(registry), 4)
            .with_timing(Duration::from_secs(5), Duration::from_millis(1)),
    );
    let channel_ids = channels.iter().map(|c| c.id.clone()).collect();
    dispatcher.dispatch(stored.clone(), channel_ids).await.unwrap();

    let after = store.get_alert(&stored.id).await.unwrap().unwrap();
    (store, after)
}

#[tokio::test]
async fn one_failing_channel_does_not_block_the_others() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::PermanentFailFor("ch-b")));
    let channels = vec![
        channel("ch-a", Severity::Info, true),
        channel("ch-b", Severity::Info, true),
        channel("ch-c", Severity::Info, true),
    ];
    let a = alert("al-iso", Severity::Critical);

    let (_store, after) = dispatch_harness(Arc::clone(&notifier), &channels, &a).await;

    assert_eq!(after.notification_status["ch-a"], DeliveryStatus::Sent);
    assert_eq!(after.notification_status["ch-b"], DeliveryStatus::Failed);
    assert_eq!(after.notification_status["ch-c"], DeliveryStatus::Sent);
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::TransientFailures(2)));
    let channels = vec![channel("ch-retry", Severity::Info, true)];
    let a = alert("al-retry", Severity::Warning);

    let (_store, after) = dispatch_harness(Arc::clone(&notifier), &channels, &a).await;

    assert_eq!(after.notification_status["ch-retry"], DeliveryStatus::Sent);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanent_failures_are_not_retried() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::PermanentFailFor("ch-perm")));
    let channels = vec![channel("ch-perm", Severity::Info, true)];
    let a = alert("al-perm", Severity::Warning);

    let (_store, after) = dispatch_harness(Arc::clone(&notifier), &channels, &a).await;

    assert_eq!(after.notification_status["ch-perm"], DeliveryStatus::Failed);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn timed_out_sends_are_retried_as_transient() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::StallFor(1)));
    let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
    let ch = channel("ch-slow", Severity::Info, true);
    store.insert_channel(&ch).await.unwrap();
    let a = alert("al-slow", Severity::Warning);
    let stored = store
        .insert_alert_if_cooldown_elapsed(&a, 0)
        .await
        .unwrap()
        .unwrap();

    let mut registry = NotifierRegistry::new();
    registry.register(Arc::clone(&notifier) as Arc<dyn Notifier>);
    // First attempt hangs past the 50ms send timeout; the second goes
    // through. A hung endpoint must count as transient, not permanent.
    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&store), Arc::new(registry), 4)
            .with_timing(Duration::from_millis(50), Duration::from_millis(1)),
    );

    dispatcher
        .dispatch(stored.clone(), vec!["ch-slow".to_string()])
        .await
        .unwrap();

    let after = store.get_alert(&stored.id).await.unwrap().unwrap();
    assert_eq!(after.notification_status["ch-slow"], DeliveryStatus::Sent);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retries_exhaust_and_record_failed() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::TransientFailures(10)));
    let channels = vec![channel("ch-down", Severity::Info, true)];
    let a = alert("al-down", Severity::Warning);

    let (_store, after) = dispatch_harness(Arc::clone(&notifier), &channels, &a).await;

    assert_eq!(after.notification_status["ch-down"], DeliveryStatus::Failed);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn skipped_channels_get_a_skipped_status() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::Ok));
    let channels = vec![
        channel("ch-on", Severity::Info, true),
        channel("ch-off", Severity::Info, false),
        channel("ch-crit-only", Severity::Critical, true),
    ];
    let a = alert("al-skip", Severity::Info);

    let (_store, after) = dispatch_harness(Arc::clone(&notifier), &channels, &a).await;

    assert_eq!(after.notification_status["ch-on"], DeliveryStatus::Sent);
    assert_eq!(after.notification_status["ch-off"], DeliveryStatus::Skipped);
    assert_eq!(
        after.notification_status["ch-crit-only"],
        DeliveryStatus::Skipped
    );
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_channel_ids_are_tolerated() {
    let notifier = Arc::new(ScriptedNotifier::new(Script::Ok));
    let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
    let ch = channel("ch-real", Severity::Info, true);
    store.insert_channel(&ch).await.unwrap();
    let a = alert("al-miss", Severity::Warning);
    let stored = store
        .insert_alert_if_cooldown_elapsed(&a, 0)
        .await
        .unwrap()
        .unwrap();

    let mut registry = NotifierRegistry::new();
    registry.register(Arc::clone(&notifier) as Arc<dyn Notifier>);
    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&store), Arc::new(registry), 4)
            .with_timing(Duration::from_secs(5), Duration::from_millis(1)),
    );

    dispatcher
        .dispatch(
            stored.clone(),
            vec!["ch-real".to_string(), "ch-gone".to_string()],
        )
        .await
        .unwrap();

    let after = store.get_alert(&stored.id).await.unwrap().unwrap();
    assert_eq!(after.notification_status["ch-real"], DeliveryStatus::Sent);
    assert!(!after.notification_status.contains_key("ch-gone"));
}
