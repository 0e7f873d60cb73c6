//! Rule evaluation engine.
//!
//! Each cycle loads the enabled rules, evaluates every rule against the
//! latest metric samples from a [`MetricFeed`], and hands triggered
//! alerts to the notification dispatcher. Mutes and per-(rule, host)
//! cooldowns suppress triggers before anything is persisted or sent.

pub mod engine;
pub mod evaluator;


use anyhow::Result;
use async_trait::async_trait;
use vigil_common::types::MetricSample;

pub use engine::{AlertEngine, CycleStats};
pub use evaluator::{evaluate, Decision};

/// Source of metric samples the engine evaluates rules against.
///
/// Implemented by the metrics store in production; tests substitute a
/// fixed in-memory feed.
#[async_trait]
pub trait MetricFeed: Send + Sync {
    /// Latest sample for a metric on one host, if any has been reported.
    async fn latest_sample(
        &self,
        metric_name: &str,
        host_id: &str,
    ) -> Result<Option<MetricSample>>;

    /// Hosts currently reporting the metric. Drives fan-out for rules
    /// that are not pinned to a single host.
    async fn hosts_reporting(&self, metric_name: &str) -> Result<Vec<String>>;
}
