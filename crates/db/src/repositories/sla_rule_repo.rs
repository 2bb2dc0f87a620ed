//! Repository for the `sla_rules` table.

use sqlx::PgPool;
use servicedesk_core::priority::Priority;
use servicedesk_core::sla::SlaRule;

use crate::models::sla_rule::SlaRuleRow;

/// Column list for `sla_rules` queries.
const COLUMNS: &str = "\
    id, priority, response_time_hours, resolution_time_hours, \
    escalation_threshold_percent, is_active, created_at, updated_at";

/// Provides access to the SLA catalog.
pub struct SlaRuleRepo;

impl SlaRuleRepo {
    /// Find the active rule for a priority.
    pub async fn find_active(
        pool: &PgPool,
        priority: Priority,
    ) -> Result<Option<SlaRuleRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM sla_rules WHERE priority = $1 AND is_active = true");
        sqlx::query_as::<_, SlaRuleRow>(&query)
            .bind(priority.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List all rules, active or not, ordered by priority.
    pub async fn list(pool: &PgPool) -> Result<Vec<SlaRuleRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sla_rules ORDER BY priority");
        sqlx::query_as::<_, SlaRuleRow>(&query).fetch_all(pool).await
    }

    /// Insert the rule for its priority, or replace the existing one.
    pub async fn upsert(pool: &PgPool, rule: &SlaRule) -> Result<SlaRuleRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sla_rules \
                (priority, response_time_hours, resolution_time_hours, \
                 escalation_threshold_percent, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (priority) DO UPDATE SET \
                response_time_hours = EXCLUDED.response_time_hours, \
                resolution_time_hours = EXCLUDED.resolution_time_hours, \
                escalation_threshold_percent = EXCLUDED.escalation_threshold_percent, \
                is_active = EXCLUDED.is_active, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlaRuleRow>(&query)
            .bind(rule.priority.as_str())
            .bind(rule.response_time_hours)
            .bind(rule.resolution_time_hours)
            .bind(rule.escalation_threshold_percent)
            .bind(rule.is_active)
            .fetch_one(pool)
            .await
    }
}
