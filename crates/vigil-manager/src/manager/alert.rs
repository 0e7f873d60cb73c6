use chrono::{Duration, Utc};
use tracing::info;

use crate::error::{ManagerError, Result};
use crate::manager::{AlertManager, DEFAULT_LIST_LIMIT};
use vigil_common::types::{Alert, Severity};
use vigil_storage::{AlertFilter, AlertStatistics};

impl AlertManager {
    pub async fn get_alert(&self, id: &str) -> Result<Alert> {
        self.store()
            .get_alert(id)
            .await?
            .ok_or_else(|| ManagerError::not_found("alert", id))
    }

    /// Unresolved alerts, newest first, optionally narrowed by severity
    /// and host.
    pub async fn list_active_alerts(
        &self,
        severity: Option<Severity>,
        host_id: Option<String>,
    ) -> Result<Vec<Alert>> {
        let filter = AlertFilter {
            severity_eq: severity,
            host_id_eq: host_id,
            active_only: true,
            ..AlertFilter::default()
        };
        Ok(self
            .store()
            .list_alerts(&filter, DEFAULT_LIST_LIMIT, 0)
            .await?)
    }

    /// Alerts triggered within the trailing window, resolved or not.
    pub async fn list_recent_alerts(&self, hours: u32) -> Result<Vec<Alert>> {
        let filter = AlertFilter {
            triggered_after: Some(Utc::now() - Duration::hours(i64::from(hours))),
            ..AlertFilter::default()
        };
        Ok(self
            .store()
            .list_alerts(&filter, DEFAULT_LIST_LIMIT, 0)
            .await?)
    }

    /// Marks an alert acknowledged. Acknowledging twice is a no-op that
    /// keeps the original acknowledgement; a resolved alert cannot be
    /// acknowledged.
    pub async fn acknowledge_alert(&self, id: &str, user: &str) -> Result<Alert> {
        if user.trim().is_empty() {
            return Err(ManagerError::Validation("user must not be empty".into()));
        }
        let alert = self.get_alert(id).await?;
        if !alert.is_active() {
            return Err(ManagerError::InvalidTransition(format!(
                "alert {id} is already resolved"
            )));
        }
        if alert.is_acknowledged() {
            return Ok(alert);
        }
        self.store()
            .set_acknowledged(id, user, Utc::now())
            .await?
            .ok_or_else(|| ManagerError::not_found("alert", id))
    }

    /// Resolves an alert. Resolving an already-resolved alert is a no-op
    /// that keeps the original resolution.
    pub async fn resolve_alert(
        &self,
        id: &str,
        user: &str,
        notes: Option<&str>,
    ) -> Result<Alert> {
        if user.trim().is_empty() {
            return Err(ManagerError::Validation("user must not be empty".into()));
        }
        let alert = self.get_alert(id).await?;
        if !alert.is_active() {
            return Ok(alert);
        }
        let resolved = self
            .store()
            .set_resolved(id, user, notes, Utc::now())
            .await?
            .ok_or_else(|| ManagerError::not_found("alert", id))?;
        info!(alert_id = %id, resolved_by = %user, "alert resolved");
        Ok(resolved)
    }

    /// Auto-resolves unresolved alerts older than the window, attributed
    /// to the system. Returns how many were swept.
    pub async fn resolve_stale_alerts(&self, older_than_hours: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::hours(i64::from(older_than_hours));
        let swept = self
            .store()
            .resolve_alerts_older_than(cutoff, "system")
            .await?;
        if swept > 0 {
            info!(count = swept, older_than_hours, "stale alerts auto-resolved");
        }
        Ok(swept)
    }

    pub async fn get_alert_statistics(&self, days: u32) -> Result<AlertStatistics> {
        let since = Utc::now() - Duration::days(i64::from(days));
        Ok(self.store().alert_statistics(since).await?)
    }
}
