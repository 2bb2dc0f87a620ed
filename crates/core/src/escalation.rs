//! Escalation severities, sources, and SLA consumption math.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum length for a manual escalation reason.
pub const MAX_ESCALATION_REASON_LENGTH: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationSeverity::Low => "low",
            EscalationSeverity::Medium => "medium",
            EscalationSeverity::High => "high",
            EscalationSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for EscalationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscalationSeverity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(EscalationSeverity::Low),
            "medium" => Ok(EscalationSeverity::Medium),
            "high" => Ok(EscalationSeverity::High),
            "critical" => Ok(EscalationSeverity::Critical),
            _ => Err(CoreError::Validation(format!(
                "Invalid escalation severity '{s}'. Must be one of: low, medium, high, critical"
            ))),
        }
    }
}

/// Who created an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSource {
    Manual,
    SlaAuto,
}

impl EscalationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationSource::Manual => "manual",
            EscalationSource::SlaAuto => "sla_auto",
        }
    }
}

impl fmt::Display for EscalationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscalationSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(EscalationSource::Manual),
            "sla_auto" => Ok(EscalationSource::SlaAuto),
            _ => Err(CoreError::Validation(format!(
                "Invalid escalation source '{s}'. Must be one of: manual, sla_auto"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SLA consumption
// ---------------------------------------------------------------------------

/// Fraction of the resolution window consumed at `now`.
///
/// `0.0` at `started_at`, `1.0` at `resolution_due`, above `1.0` once
/// breached. A window of zero or negative length counts as fully consumed.
pub fn elapsed_fraction(started_at: Timestamp, resolution_due: Timestamp, now: Timestamp) -> f64 {
    let window = (resolution_due - started_at).num_milliseconds();
    if window <= 0 {
        return 1.0;
    }
    let elapsed = (now - started_at).num_milliseconds();
    elapsed as f64 / window as f64
}

/// Whether a consumption fraction has reached `threshold_percent`.
pub fn crosses_threshold(fraction: f64, threshold_percent: i32) -> bool {
    fraction * 100.0 >= f64::from(threshold_percent)
}

/// Severity of an automatic escalation for a consumption fraction.
///
/// A breached SLA (`>= 100%`) is critical; anything past the threshold but
/// not yet breached is high.
pub fn auto_severity(fraction: f64) -> EscalationSeverity {
    if fraction >= 1.0 {
        EscalationSeverity::Critical
    } else {
        EscalationSeverity::High
    }
}

/// Human-readable reason recorded on an automatic escalation.
pub fn auto_reason(fraction: f64, threshold_percent: i32) -> String {
    let percent = fraction * 100.0;
    if fraction >= 1.0 {
        format!("SLA resolution deadline breached ({percent:.1}% of resolution time elapsed)")
    } else {
        format!(
            "SLA at risk: {percent:.1}% of resolution time elapsed \
             (threshold {threshold_percent}%)"
        )
    }
}

/// Validate a manual escalation reason: required, trimmed, length-capped.
pub fn validate_manual_reason(reason: &str) -> Result<String, CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "An escalation reason is required".to_string(),
        ));
    }
    if reason.chars().count() > MAX_ESCALATION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Escalation reason exceeds maximum length of {MAX_ESCALATION_REASON_LENGTH} characters"
        )));
    }
    Ok(reason.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn fraction_at_three_hours_twenty_of_four_hours() {
        let due = t0() + Duration::hours(4);
        let now = t0() + Duration::minutes(200);
        let fraction = elapsed_fraction(t0(), due, now);
        assert!((fraction - 0.8333).abs() < 0.001);
        assert!(crosses_threshold(fraction, 80));
        assert_eq!(auto_severity(fraction), EscalationSeverity::High);
    }

    #[test]
    fn below_threshold_does_not_cross() {
        let due = t0() + Duration::hours(4);
        let fraction = elapsed_fraction(t0(), due, t0() + Duration::hours(3));
        assert!(!crosses_threshold(fraction, 80));
    }

    #[test]
    fn exactly_at_threshold_crosses() {
        let due = t0() + Duration::hours(10);
        let fraction = elapsed_fraction(t0(), due, t0() + Duration::hours(8));
        assert!(crosses_threshold(fraction, 80));
    }

    #[test]
    fn breached_is_critical() {
        let due = t0() + Duration::hours(4);
        let fraction = elapsed_fraction(t0(), due, t0() + Duration::hours(5));
        assert!(fraction > 1.0);
        assert_eq!(auto_severity(fraction), EscalationSeverity::Critical);
        assert!(auto_reason(fraction, 80).contains("breached"));
    }

    #[test]
    fn empty_window_counts_as_consumed() {
        assert_eq!(elapsed_fraction(t0(), t0(), t0()), 1.0);
        assert_eq!(elapsed_fraction(t0(), t0() - Duration::hours(1), t0()), 1.0);
    }

    #[test]
    fn severity_and_source_parse() {
        assert_eq!("critical".parse::<EscalationSeverity>().unwrap(), EscalationSeverity::Critical);
        assert_eq!("sla_auto".parse::<EscalationSource>().unwrap(), EscalationSource::SlaAuto);
        assert!("urgent".parse::<EscalationSeverity>().is_err());
        assert!("auto".parse::<EscalationSource>().is_err());
    }

    #[test]
    fn manual_reason_is_required() {
        assert!(validate_manual_reason("  ").is_err());
        assert_eq!(validate_manual_reason(" VIP user ").unwrap(), "VIP user");
        let long = "x".repeat(MAX_ESCALATION_REASON_LENGTH + 1);
        assert!(validate_manual_reason(&long).is_err());
    }
}
