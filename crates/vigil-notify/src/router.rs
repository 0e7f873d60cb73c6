use vigil_common::channel::NotificationChannel;
use vigil_common::types::Severity;

/// Why a channel was excluded from a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    BelowMinSeverity,
}

/// Outcome of routing one alert against its candidate channels.
#[derive(Debug, Default)]
pub struct RoutePlan {
    pub targets: Vec<NotificationChannel>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Filters candidate channels down to the ones that should receive an
/// alert of the given severity. Disabled channels and channels whose
/// minimum severity exceeds the alert's are skipped, with the reason
/// recorded so the caller can mark their delivery status.
pub fn route(channels: Vec<NotificationChannel>, severity: Severity) -> RoutePlan {
    let mut plan = RoutePlan::default();
    for channel in channels {
        if !channel.enabled {
            plan.skipped.push((channel.id, SkipReason::Disabled));
        } else if severity < channel.min_severity {
            plan.skipped.push((channel.id, SkipReason::BelowMinSeverity));
        } else {
            plan.targets.push(channel);
        }
    }
    plan
}
