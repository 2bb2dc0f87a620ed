use std::time::Duration;

use servicedesk_core::sla::{validate_threshold, DEFAULT_ESCALATION_THRESHOLD_PERCENT};
use servicedesk_lifecycle::{AutoCloseConfig, LifecycleSettings};

/// Background job configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub escalation_interval: Duration,
    /// Threshold percent for priorities without an active rule.
    pub default_escalation_threshold: i32,
    /// Shared by both auto-close jobs.
    pub auto_close_interval: Duration,
    pub pending_confirmation_days: i64,
    pub resolved_business_days: i64,
    /// Whether the API process hosts the scheduler.
    pub enabled: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            escalation_interval: Duration::from_secs(15 * 60),
            default_escalation_threshold: DEFAULT_ESCALATION_THRESHOLD_PERCENT,
            auto_close_interval: Duration::from_secs(60 * 60),
            pending_confirmation_days: 7,
            resolved_business_days: 3,
            enabled: true,
        }
    }
}

impl JobConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default |
    /// |-------------------------------------|---------|
    /// | `ESCALATION_SCAN_INTERVAL_MINS`     | `15`    |
    /// | `ESCALATION_THRESHOLD_DEFAULT`      | `80`    |
    /// | `AUTO_CLOSE_INTERVAL_MINS`          | `60`    |
    /// | `PENDING_CONFIRMATION_DAYS`         | `7`     |
    /// | `RESOLVED_AUTO_CLOSE_BUSINESS_DAYS` | `3`     |
    /// | `JOBS_ENABLED`                      | `true`  |
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let escalation_mins: u64 = env_or("ESCALATION_SCAN_INTERVAL_MINS", "15")
            .parse()
            .expect("ESCALATION_SCAN_INTERVAL_MINS must be a valid u64");

        let default_escalation_threshold: i32 = env_or("ESCALATION_THRESHOLD_DEFAULT", "80")
            .parse()
            .expect("ESCALATION_THRESHOLD_DEFAULT must be a valid i32");
        validate_threshold(default_escalation_threshold)
            .expect("ESCALATION_THRESHOLD_DEFAULT must be between 1 and 100");

        let auto_close_mins: u64 = env_or("AUTO_CLOSE_INTERVAL_MINS", "60")
            .parse()
            .expect("AUTO_CLOSE_INTERVAL_MINS must be a valid u64");

        let pending_confirmation_days = parse_days(
            "PENDING_CONFIRMATION_DAYS",
            &env_or("PENDING_CONFIRMATION_DAYS", "7"),
        );
        let resolved_business_days = parse_days(
            "RESOLVED_AUTO_CLOSE_BUSINESS_DAYS",
            &env_or("RESOLVED_AUTO_CLOSE_BUSINESS_DAYS", "3"),
        );

        let enabled = parse_flag(&env_or("JOBS_ENABLED", "true"));

        assert!(escalation_mins > 0, "ESCALATION_SCAN_INTERVAL_MINS must be positive");
        assert!(auto_close_mins > 0, "AUTO_CLOSE_INTERVAL_MINS must be positive");

        Self {
            escalation_interval: Duration::from_secs(escalation_mins * 60),
            default_escalation_threshold,
            auto_close_interval: Duration::from_secs(auto_close_mins * 60),
            pending_confirmation_days,
            resolved_business_days,
            enabled,
        }
    }

    /// The lifecycle tunables derived from this configuration.
    pub fn settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            default_escalation_threshold: self.default_escalation_threshold,
            auto_close: AutoCloseConfig {
                pending_confirmation_days: self.pending_confirmation_days,
                resolved_business_days: self.resolved_business_days,
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Parse an auto-close window in days. Zero or more.
fn parse_days(key: &str, raw: &str) -> i64 {
    let days: i64 = raw
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid i64"));
    assert!(days >= 0, "{key} must not be negative");
    days
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
