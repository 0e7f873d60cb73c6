use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::evaluator::{self, Decision};
use crate::MetricFeed;
use vigil_common::id;
use vigil_common::types::{Alert, AlertRule};
use vigil_notify::dispatcher::Dispatcher;
use vigil_storage::Store;

/// Counters reported by one evaluation cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub rules_evaluated: usize,
    pub alerts_triggered: u64,
}

/// Why one rule's evaluation pass failed.
enum RuleFailure {
    /// Metric feed error; only this rule is skipped for the cycle.
    Feed(anyhow::Error),
    /// Repository error; fatal for the whole cycle.
    Persistence(anyhow::Error),
}

/// Periodic rule evaluator.
///
/// Rules are evaluated concurrently up to a semaphore limit, with a
/// per-cycle deadline; a rule whose metrics cannot be read is logged
/// and skipped without blocking the others, while a repository failure
/// aborts the cycle. Triggered alerts pass the mute check and the
/// cooldown-guarded insert before being handed to the dispatcher.
#[derive(Clone)]
pub struct AlertEngine {
    store: Arc<Store>,
    feed: Arc<dyn MetricFeed>,
    dispatcher: Arc<Dispatcher>,
    limit: Arc<Semaphore>,
    cycle_deadline: Duration,
}

impl AlertEngine {
    pub fn new(store: Arc<Store>, feed: Arc<dyn MetricFeed>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            feed,
            dispatcher,
            limit: Arc::new(Semaphore::new(8)),
            cycle_deadline: Duration::from_secs(30),
        }
    }

    /// Overrides the rule-evaluation concurrency and per-cycle deadline.
    pub fn with_limits(mut self, max_concurrent_rules: usize, cycle_deadline: Duration) -> Self {
        self.limit = Arc::new(Semaphore::new(max_concurrent_rules.max(1)));
        self.cycle_deadline = cycle_deadline;
        self
    }

    /// Runs evaluation cycles forever on a fixed tick.
    ///
    /// A cycle that overruns its tick does not queue catch-up cycles.
    pub async fn run(self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_secs = tick.as_secs(), "alert engine started");
        loop {
            interval.tick().await;
            match self.run_cycle().await {
                Ok(stats) => debug!(
                    rules = stats.rules_evaluated,
                    triggered = stats.alerts_triggered,
                    "evaluation cycle finished"
                ),
                Err(e) => error!(error = %e, "evaluation cycle failed"),
            }
        }
    }

    /// Evaluates all enabled rules once.
    ///
    /// Feed failures skip only the affected rule; a repository failure
    /// (loading the rule set, mute lookup, alert insert) aborts the
    /// whole cycle so it is retried at the next tick. The deadline
    /// bounds the full cycle, including waiting for an evaluation slot,
    /// so stalled rules can never block it indefinitely.
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let rules = self.store.list_rules(true).await?;
        let mut stats = CycleStats {
            rules_evaluated: rules.len(),
            ..CycleStats::default()
        };
        let deadline = Instant::now() + self.cycle_deadline;

        let mut handles = Vec::with_capacity(rules.len());
        for rule in rules {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let permit = match timeout(remaining, self.limit.clone().acquire_owned()).await {
                Ok(permit) => permit?,
                Err(_) => {
                    warn!("cycle deadline exceeded, skipping remaining rules");
                    break;
                }
            };
            let engine = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let rule_id = rule.id.clone();
                (rule_id, engine.evaluate_rule(&rule).await)
            }));
        }

        let mut handles = handles.into_iter();
        while let Some(mut handle) = handles.next() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, &mut handle).await {
                Ok(Ok((_, Ok(triggered)))) => stats.alerts_triggered += triggered,
                Ok(Ok((rule_id, Err(RuleFailure::Feed(e))))) => {
                    warn!(rule_id = %rule_id, error = %e, "rule evaluation failed")
                }
                Ok(Ok((rule_id, Err(RuleFailure::Persistence(e))))) => {
                    for pending in handles.by_ref() {
                        pending.abort();
                    }
                    return Err(e.context(format!("alert persistence failed for rule {rule_id}")));
                }
                Ok(Err(e)) => error!(error = %e, "rule evaluation task panicked"),
                Err(_) => {
                    handle.abort();
                    warn!("cycle deadline exceeded, skipping remaining rules");
                }
            }
        }

        Ok(stats)
    }

    /// Evaluates one rule across its target hosts, returning how many
    /// alerts it triggered.
    async fn evaluate_rule(&self, rule: &AlertRule) -> Result<u64, RuleFailure> {
        let hosts = match &rule.host_id {
            Some(host) => vec![host.clone()],
            None => self
                .feed
                .hosts_reporting(&rule.metric_name)
                .await
                .map_err(RuleFailure::Feed)?,
        };

        let mut triggered = 0;
        for host in hosts {
            let Some(sample) = self
                .feed
                .latest_sample(&rule.metric_name, &host)
                .await
                .map_err(RuleFailure::Feed)?
            else {
                continue;
            };
            let Decision::Trigger {
                value,
                threshold,
                message,
            } = evaluator::evaluate(rule, &sample)
            else {
                continue;
            };

            let now = Utc::now();
            let mutes = self
                .store
                .active_mutes_covering(&rule.id, &host, now)
                .await
                .map_err(RuleFailure::Persistence)?;
            if !mutes.is_empty() {
                debug!(rule_id = %rule.id, host_id = %host, "trigger suppressed by mute");
                continue;
            }

            let alert = Alert {
                id: id::next_id(),
                rule_id: rule.id.clone(),
                host_id: host.clone(),
                metric_name: rule.metric_name.clone(),
                value,
                threshold,
                severity: rule.severity,
                message,
                triggered_at: now,
                acknowledged_at: None,
                acknowledged_by: None,
                resolved_at: None,
                resolved_by: None,
                resolution_notes: None,
                notification_status: HashMap::new(),
            };

            match self
                .store
                .insert_alert_if_cooldown_elapsed(&alert, rule.cooldown_minutes)
                .await
                .map_err(RuleFailure::Persistence)?
            {
                Some(stored) => {
                    info!(
                        alert_id = %stored.id,
                        rule_id = %rule.id,
                        host_id = %host,
                        severity = %stored.severity,
                        value = stored.value,
                        "alert triggered"
                    );
                    let channel_ids = rule.notification_channel_ids.clone();
                    let _detached = self.dispatcher.dispatch(stored, channel_ids);
                    triggered += 1;
                }
                None => {
                    debug!(rule_id = %rule.id, host_id = %host, "trigger suppressed by cooldown")
                }
            }
        }

        Ok(triggered)
    }
}
