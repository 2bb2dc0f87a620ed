//! Row model for the `ticket_status_history` table.

use sqlx::FromRow;
use servicedesk_core::model::StatusHistoryEntry;
use servicedesk_core::store::StoreError;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `ticket_status_history` table.
#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryRow {
    pub id: DbId,
    pub ticket_id: DbId,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Option<DbId>,
    pub reason: Option<String>,
    pub changed_at: Timestamp,
}

impl TryFrom<StatusHistoryRow> for StatusHistoryEntry {
    type Error = StoreError;

    fn try_from(row: StatusHistoryRow) -> Result<Self, Self::Error> {
        Ok(StatusHistoryEntry {
            id: row.id,
            ticket_id: row.ticket_id,
            old_status: parse_column("ticket_status_history.old_status", &row.old_status)?,
            new_status: parse_column("ticket_status_history.new_status", &row.new_status)?,
            changed_by: row.changed_by,
            reason: row.reason,
            changed_at: row.changed_at,
        })
    }
}
