use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use vigil_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Kind of condition an [`AlertRule`] expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Numeric comparison of the latest sample value against a threshold.
    Threshold,
    /// Comparison of a discrete status value (e.g. 0 = offline, 1 = online).
    StatusChange,
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleType::Threshold => write!(f, "threshold"),
            RuleType::StatusChange => write!(f, "status_change"),
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" => Ok(RuleType::Threshold),
            "status_change" => Ok(RuleType::StatusChange),
            _ => Err(format!("unknown rule type: {s}")),
        }
    }
}

/// Comparison operator applied between a sample value and a rule threshold.
///
/// Equality comparisons are exact floating-point matches; there is no
/// epsilon. Callers that need tolerance should express it as `gte`/`lte`
/// bounds instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl Condition {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Condition::Gt => value > threshold,
            Condition::Gte => value >= threshold,
            Condition::Lt => value < threshold,
            Condition::Lte => value <= threshold,
            Condition::Eq => value == threshold,
            Condition::Ne => value != threshold,
        }
    }

    /// Human-readable phrasing used in alert messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Condition::Gt => "above",
            Condition::Gte => "at or above",
            Condition::Lt => "below",
            Condition::Lte => "at or below",
            Condition::Eq => "equal to",
            Condition::Ne => "not equal to",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Condition::Gt => "gt",
            Condition::Gte => "gte",
            Condition::Lt => "lt",
            Condition::Lte => "lte",
            Condition::Eq => "eq",
            Condition::Ne => "ne",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(Condition::Gt),
            "gte" => Ok(Condition::Gte),
            "lt" => Ok(Condition::Lt),
            "lte" => Ok(Condition::Lte),
            "eq" => Ok(Condition::Eq),
            "ne" => Ok(Condition::Ne),
            _ => Err(format!("unknown condition: {s}")),
        }
    }
}

/// One metric observation delivered by the collection pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub host_id: String,
    pub metric_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A persistent alert condition definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    /// Unique across all rules.
    pub name: String,
    pub rule_type: RuleType,
    pub metric_name: String,
    /// `None` applies the rule to every host reporting the metric.
    pub host_id: Option<String>,
    pub condition: Condition,
    pub threshold: f64,
    pub severity: Severity,
    pub enabled: bool,
    pub notification_channel_ids: Vec<String>,
    /// Minimum minutes between successive alerts for the same (rule, host).
    pub cooldown_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-channel delivery outcome recorded on an [`Alert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// One triggered instance of a rule, with its own lifecycle.
///
/// Lifecycle is monotonic: triggered, optionally acknowledged, then
/// resolved. Resolved is terminal; a re-trigger after resolution creates
/// a new alert row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub host_id: String,
    pub metric_name: String,
    pub value: f64,
    pub threshold: f64,
    /// Copied from the rule at trigger time; later rule edits do not
    /// rewrite alert history.
    pub severity: Severity,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
    /// channel_id -> delivery outcome, updated as each channel resolves.
    pub notification_status: HashMap<String, DeliveryStatus>,
}

impl Alert {
    /// An alert is active until it is resolved.
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}

/// Temporary or indefinite suppression of a rule, optionally host-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMute {
    pub id: String,
    pub rule_id: String,
    /// `None` suppresses the rule for all hosts.
    pub host_id: Option<String>,
    pub muted_by: String,
    pub muted_at: DateTime<Utc>,
    /// `None` means indefinite.
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl AlertMute {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires) => expires > now,
        }
    }

    /// Whether this mute covers a trigger for the given host.
    pub fn covers(&self, host_id: &str) -> bool {
        match self.host_id.as_deref() {
            None => true,
            Some(h) => h == host_id,
        }
    }
}
