use vigil_common::types::{AlertRule, MetricSample, RuleType};

/// Outcome of evaluating one rule against one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoTrigger,
    Trigger {
        value: f64,
        threshold: f64,
        message: String,
    },
}

/// Evaluates a rule's condition against a sample.
///
/// Pure: suppression (mutes, cooldowns) and persistence are the
/// engine's concern. The message is rendered here so that the alert row
/// carries the wording that matched at trigger time.
pub fn evaluate(rule: &AlertRule, sample: &MetricSample) -> Decision {
    if !rule.condition.check(sample.value, rule.threshold) {
        return Decision::NoTrigger;
    }

    let message = match rule.rule_type {
        RuleType::Threshold => format!(
            "{} is {} {:.2} (current: {:.2})",
            rule.metric_name,
            rule.condition.describe(),
            rule.threshold,
            sample.value,
        ),
        RuleType::StatusChange => format!(
            "{} status on {} is {} {:.0} (current: {:.0})",
            rule.metric_name,
            sample.host_id,
            rule.condition.describe(),
            rule.threshold,
            sample.value,
        ),
    };

    Decision::Trigger {
        value: sample.value,
        threshold: rule.threshold,
        message,
    }
}
