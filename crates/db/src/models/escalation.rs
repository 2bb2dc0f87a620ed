//! Row model for the `ticket_escalations` table.

use sqlx::FromRow;
use servicedesk_core::model::Escalation;
use servicedesk_core::store::StoreError;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `ticket_escalations` table.
#[derive(Debug, Clone, FromRow)]
pub struct EscalationRow {
    pub id: DbId,
    pub ticket_id: DbId,
    pub severity: String,
    pub reason: String,
    pub source: String,
    pub escalated_by: Option<DbId>,
    pub elapsed_percent: Option<f64>,
    pub escalated_at: Timestamp,
}

impl TryFrom<EscalationRow> for Escalation {
    type Error = StoreError;

    fn try_from(row: EscalationRow) -> Result<Self, Self::Error> {
        Ok(Escalation {
            id: row.id,
            ticket_id: row.ticket_id,
            severity: parse_column("ticket_escalations.severity", &row.severity)?,
            reason: row.reason,
            source: parse_column("ticket_escalations.source", &row.source)?,
            escalated_by: row.escalated_by,
            elapsed_percent: row.elapsed_percent,
            escalated_at: row.escalated_at,
        })
    }
}
