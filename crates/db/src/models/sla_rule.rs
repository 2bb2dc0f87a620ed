//! Row model for the `sla_rules` table.

use sqlx::FromRow;
use servicedesk_core::sla::SlaRule;
use servicedesk_core::store::StoreError;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `sla_rules` table.
#[derive(Debug, Clone, FromRow)]
pub struct SlaRuleRow {
    pub id: DbId,
    pub priority: String,
    pub response_time_hours: i32,
    pub resolution_time_hours: i32,
    pub escalation_threshold_percent: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<SlaRuleRow> for SlaRule {
    type Error = StoreError;

    fn try_from(row: SlaRuleRow) -> Result<Self, Self::Error> {
        Ok(SlaRule {
            priority: parse_column("sla_rules.priority", &row.priority)?,
            response_time_hours: row.response_time_hours,
            resolution_time_hours: row.resolution_time_hours,
            escalation_threshold_percent: row.escalation_threshold_percent,
            is_active: row.is_active,
        })
    }
}
