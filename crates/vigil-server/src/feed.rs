use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use vigil_alert::MetricFeed;
use vigil_common::types::MetricSample;

/// Metric feed backed by a snapshot file the external collection
/// pipeline keeps current: one JSON array of the latest samples,
/// rewritten atomically on each collection pass.
///
/// A missing file reads as an empty feed, so the daemon can start
/// before the pipeline has produced anything.
pub struct SnapshotFeed {
    path: PathBuf,
}

impl SnapshotFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_snapshot(&self) -> Result<Vec<MetricSample>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read metric snapshot {}", self.path.display())
                })
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed metric snapshot {}", self.path.display()))
    }
}

#[async_trait]
impl MetricFeed for SnapshotFeed {
    async fn latest_sample(
        &self,
        metric_name: &str,
        host_id: &str,
    ) -> Result<Option<MetricSample>> {
        let samples = self.read_snapshot().await?;
        Ok(samples
            .into_iter()
            .filter(|s| s.metric_name == metric_name && s.host_id == host_id)
            .max_by_key(|s| s.timestamp))
    }

    async fn hosts_reporting(&self, metric_name: &str) -> Result<Vec<String>> {
        let samples = self.read_snapshot().await?;
        let hosts: BTreeSet<String> = samples
            .into_iter()
            .filter(|s| s.metric_name == metric_name)
            .map(|s| s.host_id)
            .collect();
        Ok(hosts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vigil-feed-{name}-{}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_feed() {
        let feed = SnapshotFeed::new("/nonexistent/vigil-metrics.json");
        assert!(feed.latest_sample("cpu_usage", "host-1").await.unwrap().is_none());
        assert!(feed.hosts_reporting("cpu_usage").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn picks_newest_sample_per_host() {
        let contents = json!([
            { "host_id": "host-1", "metric_name": "cpu_usage", "value": 50.0,
              "timestamp": "2026-08-27T10:00:00Z" },
            { "host_id": "host-1", "metric_name": "cpu_usage", "value": 95.0,
              "timestamp": "2026-08-27T10:01:00Z" },
            { "host_id": "host-2", "metric_name": "cpu_usage", "value": 40.0,
              "timestamp": "2026-08-27T10:01:00Z" }
        ])
        .to_string();
        let path = snapshot_file("newest", &contents);
        let feed = SnapshotFeed::new(&path);

        let sample = feed.latest_sample("cpu_usage", "host-1").await.unwrap().unwrap();
        assert_eq!(sample.value, 95.0);

        let hosts = feed.hosts_reporting("cpu_usage").await.unwrap();
        assert_eq!(hosts, vec!["host-1".to_string(), "host-2".to_string()]);

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn malformed_snapshot_is_an_error() {
        let path = snapshot_file("bad", "not json");
        let feed = SnapshotFeed::new(&path);
        assert!(feed.latest_sample("cpu_usage", "host-1").await.is_err());
        std::fs::remove_file(path).unwrap();
    }
}
