//! SLA catalog rules and deadline computation.
//!
//! A [`SlaRule`] maps a priority to response/resolution time budgets. The
//! deadline calculation is pure wall-clock arithmetic: no business-day
//! skipping happens at this layer.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::priority::Priority;
use crate::types::Timestamp;

/// Threshold used when a rule is created without one.
pub const DEFAULT_ESCALATION_THRESHOLD_PERCENT: i32 = 80;

/// Upper bound for a single SLA budget (one year).
pub const MAX_SLA_HOURS: i32 = 24 * 365;

/// One row of the SLA catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaRule {
    pub priority: Priority,
    pub response_time_hours: i32,
    pub resolution_time_hours: i32,
    pub escalation_threshold_percent: i32,
    pub is_active: bool,
}

/// Admin input for creating or replacing the rule of one priority.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SlaRuleInput {
    #[validate(range(min = 1, max = MAX_SLA_HOURS))]
    pub response_time_hours: i32,
    #[validate(range(min = 1, max = MAX_SLA_HOURS))]
    pub resolution_time_hours: i32,
    #[validate(range(min = 1, max = 100))]
    pub escalation_threshold_percent: Option<i32>,
    pub is_active: Option<bool>,
}

impl SlaRuleInput {
    /// Validate the input and build the rule it describes for `priority`.
    ///
    /// `default_threshold` fills in a missing escalation threshold.
    pub fn into_rule(self, priority: Priority, default_threshold: i32) -> Result<SlaRule, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid SLA rule: {e}")))?;

        if self.resolution_time_hours < self.response_time_hours {
            return Err(CoreError::Validation(
                "resolution_time_hours must be greater than or equal to response_time_hours"
                    .to_string(),
            ));
        }

        let threshold = self.escalation_threshold_percent.unwrap_or(default_threshold);
        validate_threshold(threshold)?;

        Ok(SlaRule {
            priority,
            response_time_hours: self.response_time_hours,
            resolution_time_hours: self.resolution_time_hours,
            escalation_threshold_percent: threshold,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Validate an escalation threshold percentage (`1..=100`).
pub fn validate_threshold(percent: i32) -> Result<(), CoreError> {
    if (1..=100).contains(&percent) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Escalation threshold must be between 1 and 100 percent (got {percent})"
        )))
    }
}

/// Response and resolution deadlines computed for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaDeadlines {
    pub response_due: Timestamp,
    pub resolution_due: Timestamp,
}

/// Compute SLA deadlines starting at `from`.
///
/// Returns `None` when there is no rule or the rule is inactive; such a
/// ticket has no enforceable SLA and can never breach.
pub fn compute_deadlines(rule: Option<&SlaRule>, from: Timestamp) -> Option<SlaDeadlines> {
    let rule = rule.filter(|r| r.is_active)?;
    Some(SlaDeadlines {
        response_due: from + Duration::hours(i64::from(rule.response_time_hours)),
        resolution_due: from + Duration::hours(i64::from(rule.resolution_time_hours)),
    })
}
