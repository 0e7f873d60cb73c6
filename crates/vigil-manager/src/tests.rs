use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::error::ManagerError;
use crate::manager::{AlertManager, ChannelParams, RuleParams};
use vigil_alert::engine::AlertEngine;
use vigil_alert::MetricFeed;
use vigil_common::channel::ChannelType;
use vigil_common::id;
use vigil_common::types::{Alert, Condition, MetricSample, RuleType, Severity};
use vigil_notify::dispatcher::Dispatcher;
use vigil_notify::registry::NotifierRegistry;
use vigil_storage::Store;

struct FixedFeed {
    samples: Vec<MetricSample>,
}

#[async_trait]
impl MetricFeed for FixedFeed {
    async fn latest_sample(
        &self,
        metric_name: &str,
        host_id: &str,
    ) -> Result<Option<MetricSample>> {
        Ok(self
            .samples
            .iter()
            .find(|s| s.metric_name == metric_name && s.host_id == host_id)
            .cloned())
    }

    async fn hosts_reporting(&self, metric_name: &str) -> Result<Vec<String>> {
        Ok(self
            .samples
            .iter()
            .filter(|s| s.metric_name == metric_name)
            .map(|s| s.host_id.clone())
            .collect())
    }
}

async fn manager_with_samples(samples: Vec<(&str, &str, f64)>) -> AlertManager {
    let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
    let feed = FixedFeed {
        samples: samples
            .into_iter()
            .map(|(host, metric, value)| MetricSample {
                host_id: host.to_string(),
                metric_name: metric.to_string(),
                value,
                timestamp: Utc::now(),
            })
            .collect(),
    };
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store),
        Arc::new(NotifierRegistry::new()),
        4,
    ));
    let engine = AlertEngine::new(Arc::clone(&store), Arc::new(feed), dispatcher);
    AlertManager::new(store, engine)
}

async fn manager() -> AlertManager {
    manager_with_samples(Vec::new()).await
}

fn rule_params(name: &str) -> RuleParams {
    RuleParams {
        name: name.to_string(),
        rule_type: RuleType::Threshold,
        metric_name: "cpu_usage".to_string(),
        host_id: Some("host-1".to_string()),
        condition: Condition::Gt,
        threshold: 90.0,
        severity: Severity::Warning,
        enabled: true,
        notification_channel_ids: Vec::new(),
        cooldown_minutes: 5,
    }
}

fn slack_params(name: &str) -> ChannelParams {
    ChannelParams {
        name: name.to_string(),
        channel_type: ChannelType::Slack,
        config: json!({ "webhook_url": "https://hooks.slack.example/T0/B0/x", "channel": null }),
        min_severity: Severity::Info,
        enabled: true,
    }
}

async fn seed_alert(mgr: &AlertManager, rule_id: &str, triggered_at: chrono::DateTime<Utc>) -> Alert {
    let alert = Alert {
        id: id::next_id(),
        rule_id: rule_id.to_string(),
        host_id: "host-1".to_string(),
        metric_name: "cpu_usage".to_string(),
        value: 97.5,
        threshold: 90.0,
        severity: Severity::Warning,
        message: "cpu_usage is above 90.00 (current: 97.50)".to_string(),
        triggered_at,
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        resolved_by: None,
        resolution_notes: None,
        notification_status: HashMap::new(),
    };
    mgr.store()
        .insert_alert_if_cooldown_elapsed(&alert, 0)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn create_rule_rejects_duplicate_name() {
    let mgr = manager().await;
    mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let err = mgr.create_rule(rule_params("cpu-high")).await.unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn create_rule_rejects_unknown_channel() {
    let mgr = manager().await;
    let mut params = rule_params("cpu-high");
    params.notification_channel_ids = vec!["no-such-channel".to_string()];
    let err = mgr.create_rule(params).await.unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn create_rule_rejects_bad_input() {
    let mgr = manager().await;

    let mut blank = rule_params("  ");
    blank.name = "  ".to_string();
    assert!(matches!(
        mgr.create_rule(blank).await.unwrap_err(),
        ManagerError::Validation(_)
    ));

    let mut nan = rule_params("cpu-nan");
    nan.threshold = f64::NAN;
    assert!(matches!(
        mgr.create_rule(nan).await.unwrap_err(),
        ManagerError::Validation(_)
    ));
}

#[tokio::test]
async fn update_rule_keeps_created_at() {
    let mgr = manager().await;
    let created = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let mut params = rule_params("cpu-high");
    params.threshold = 80.0;
    let updated = mgr.update_rule(&created.id, params).await.unwrap();
    assert_eq!(updated.threshold, 80.0);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn disable_then_enable_rule_round_trips() {
    let mgr = manager().await;
    let created = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    assert!(!mgr.disable_rule(&created.id).await.unwrap().enabled);
    assert!(mgr.enable_rule(&created.id).await.unwrap().enabled);
}

#[tokio::test]
async fn delete_rule_then_get_is_not_found() {
    let mgr = manager().await;
    let created = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    mgr.delete_rule(&created.id).await.unwrap();
    assert!(matches!(
        mgr.get_rule(&created.id).await.unwrap_err(),
        ManagerError::NotFound { .. }
    ));
}

#[tokio::test]
async fn acknowledge_twice_keeps_first_acknowledgement() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let alert = seed_alert(&mgr, &rule.id, Utc::now()).await;

    let first = mgr.acknowledge_alert(&alert.id, "alice").await.unwrap();
    let second = mgr.acknowledge_alert(&alert.id, "bob").await.unwrap();

    assert_eq!(second.acknowledged_by.as_deref(), Some("alice"));
    assert_eq!(second.acknowledged_at, first.acknowledged_at);
}

#[tokio::test]
async fn acknowledging_resolved_alert_is_rejected() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let alert = seed_alert(&mgr, &rule.id, Utc::now()).await;

    mgr.resolve_alert(&alert.id, "alice", None).await.unwrap();
    let err = mgr.acknowledge_alert(&alert.id, "bob").await.unwrap_err();
    assert!(matches!(err, ManagerError::InvalidTransition(_)));
}

#[tokio::test]
async fn resolve_twice_keeps_first_resolution() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let alert = seed_alert(&mgr, &rule.id, Utc::now()).await;

    let first = mgr
        .resolve_alert(&alert.id, "alice", Some("restarted the service"))
        .await
        .unwrap();
    let second = mgr.resolve_alert(&alert.id, "bob", None).await.unwrap();

    assert_eq!(second.resolved_by.as_deref(), Some("alice"));
    assert_eq!(second.resolved_at, first.resolved_at);
    assert_eq!(
        second.resolution_notes.as_deref(),
        Some("restarted the service")
    );
}

#[tokio::test]
async fn stale_sweep_resolves_only_old_alerts() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let old = seed_alert(&mgr, &rule.id, Utc::now() - Duration::hours(48)).await;
    let fresh = seed_alert(&mgr, &rule.id, Utc::now()).await;

    assert_eq!(mgr.resolve_stale_alerts(24).await.unwrap(), 1);
    assert_eq!(mgr.resolve_stale_alerts(24).await.unwrap(), 0);

    let old = mgr.get_alert(&old.id).await.unwrap();
    assert!(!old.is_active());
    assert_eq!(old.resolved_by.as_deref(), Some("system"));
    assert!(mgr.get_alert(&fresh.id).await.unwrap().is_active());
}

#[tokio::test]
async fn list_active_alerts_filters_by_severity() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    seed_alert(&mgr, &rule.id, Utc::now()).await;

    let warnings = mgr
        .list_active_alerts(Some(Severity::Warning), None)
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);

    let criticals = mgr
        .list_active_alerts(Some(Severity::Critical), None)
        .await
        .unwrap();
    assert!(criticals.is_empty());
}

#[tokio::test]
async fn mute_requires_existing_rule_and_positive_duration() {
    let mgr = manager().await;
    let err = mgr
        .mute_rule("no-such-rule", None, "ops", Some(30), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::NotFound { .. }));

    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();
    let err = mgr
        .mute_rule(&rule.id, None, "ops", Some(0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn mute_and_unmute_round_trip() {
    let mgr = manager().await;
    let rule = mgr.create_rule(rule_params("cpu-high")).await.unwrap();

    let mute = mgr
        .mute_rule(&rule.id, None, "ops", None, Some("noisy".to_string()))
        .await
        .unwrap();
    assert!(mute.expires_at.is_none());
    assert_eq!(mgr.list_active_mutes().await.unwrap().len(), 1);

    assert_eq!(mgr.unmute_rule(&rule.id, None).await.unwrap(), 1);
    assert!(mgr.list_active_mutes().await.unwrap().is_empty());
}

#[tokio::test]
async fn channel_config_is_validated_on_create() {
    let mgr = manager().await;
    let bad = ChannelParams {
        name: "mail-ops".to_string(),
        channel_type: ChannelType::Email,
        config: json!({
            "smtp_host": "smtp.example.com",
            "smtp_port": 587,
            "smtp_username": null,
            "smtp_password": null,
            "from": "vigil@example.com",
            "to": []
        }),
        min_severity: Severity::Info,
        enabled: true,
    };
    let err = mgr.create_channel(bad).await.unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn channel_names_are_unique() {
    let mgr = manager().await;
    mgr.create_channel(slack_params("ops-slack")).await.unwrap();
    let err = mgr
        .create_channel(slack_params("ops-slack"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn update_channel_rejects_mismatched_config() {
    let mgr = manager().await;
    let created = mgr.create_channel(slack_params("ops-slack")).await.unwrap();

    let mut params = slack_params("ops-slack");
    params.channel_type = ChannelType::Webhook;
    // webhook schema requires `url`, which a slack blob lacks
    let err = mgr.update_channel(&created.id, params).await.unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[tokio::test]
async fn disable_channel_round_trips() {
    let mgr = manager().await;
    let created = mgr.create_channel(slack_params("ops-slack")).await.unwrap();
    assert!(!mgr.disable_channel(&created.id).await.unwrap().enabled);
    assert!(mgr.enable_channel(&created.id).await.unwrap().enabled);
}

#[tokio::test]
async fn evaluate_rules_runs_a_cycle_through_the_facade() {
    let mgr = manager_with_samples(vec![("host-1", "cpu_usage", 97.5)]).await;
    mgr.create_rule(rule_params("cpu-high")).await.unwrap();

    let stats = mgr.evaluate_rules().await.unwrap();
    assert_eq!(stats.rules_evaluated, 1);
    assert_eq!(stats.alerts_triggered, 1);

    let active = mgr.list_active_alerts(None, None).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].host_id, "host-1");
}
