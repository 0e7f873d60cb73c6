mod config;
mod feed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::feed::SnapshotFeed;
use vigil_alert::engine::AlertEngine;
use vigil_common::id;
use vigil_manager::AlertManager;
use vigil_notify::dispatcher::Dispatcher;
use vigil_notify::registry::NotifierRegistry;
use vigil_storage::Store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let cfg = ServerConfig::load(&config_path)?;
    info!(config = %config_path.display(), "configuration loaded");

    id::init(cfg.node.machine_id, cfg.node.node_id);

    let store = Arc::new(Store::new(&cfg.database.url).await?);
    let feed = Arc::new(SnapshotFeed::new(&cfg.metrics.snapshot_path));
    let registry = Arc::new(NotifierRegistry::builtin());
    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&store), registry, cfg.dispatch.max_concurrent_sends)
            .with_timing(
                Duration::from_secs(cfg.dispatch.send_timeout_secs),
                Duration::from_millis(cfg.dispatch.retry_backoff_ms),
            ),
    );
    let engine = AlertEngine::new(Arc::clone(&store), feed, dispatcher).with_limits(
        cfg.engine.max_concurrent_rules,
        Duration::from_secs(cfg.engine.cycle_deadline_secs),
    );
    let manager = Arc::new(AlertManager::new(Arc::clone(&store), engine.clone()));

    let ticker = tokio::spawn(engine.run(Duration::from_secs(cfg.engine.tick_secs)));
    let maintenance = tokio::spawn(maintenance_loop(
        Arc::clone(&manager),
        Duration::from_secs(cfg.maintenance.interval_secs),
        cfg.maintenance.stale_after_hours,
    ));

    info!("vigil daemon started");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    ticker.abort();
    maintenance.abort();
    Ok(())
}

/// Periodic housekeeping: auto-resolve stale alerts and drop expired
/// mute rows.
async fn maintenance_loop(manager: Arc<AlertManager>, interval: Duration, stale_after_hours: u32) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match manager.resolve_stale_alerts(stale_after_hours).await {
            Ok(swept) if swept > 0 => info!(count = swept, "stale alert sweep finished"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "stale alert sweep failed"),
        }
        match manager.cleanup_expired_mutes().await {
            Ok(removed) if removed > 0 => info!(count = removed, "expired mutes removed"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "mute cleanup failed"),
        }
    }
}
