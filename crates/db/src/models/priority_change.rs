//! Row model for the `ticket_priority_changes` table.

use sqlx::FromRow;
use servicedesk_core::model::PriorityChange;
use servicedesk_core::store::StoreError;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `ticket_priority_changes` table.
#[derive(Debug, Clone, FromRow)]
pub struct PriorityChangeRow {
    pub id: DbId,
    pub ticket_id: DbId,
    pub old_priority: String,
    pub new_priority: String,
    pub changed_by: Option<DbId>,
    pub override_request_id: Option<DbId>,
    pub changed_at: Timestamp,
}

impl TryFrom<PriorityChangeRow> for PriorityChange {
    type Error = StoreError;

    fn try_from(row: PriorityChangeRow) -> Result<Self, Self::Error> {
        Ok(PriorityChange {
            id: row.id,
            ticket_id: row.ticket_id,
            old_priority: parse_column("ticket_priority_changes.old_priority", &row.old_priority)?,
            new_priority: parse_column("ticket_priority_changes.new_priority", &row.new_priority)?,
            changed_by: row.changed_by,
            override_request_id: row.override_request_id,
            changed_at: row.changed_at,
        })
    }
}
