//! Row model for the `priority_override_requests` table.

use sqlx::FromRow;
use servicedesk_core::model::PriorityOverrideRequest;
use servicedesk_core::store::StoreError;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `priority_override_requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct PriorityOverrideRow {
    pub id: DbId,
    pub ticket_id: DbId,
    pub previous_priority: String,
    pub requested_priority: String,
    pub reason: String,
    pub requested_by: DbId,
    pub status: String,
    pub reviewed_by: Option<DbId>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<PriorityOverrideRow> for PriorityOverrideRequest {
    type Error = StoreError;

    fn try_from(row: PriorityOverrideRow) -> Result<Self, Self::Error> {
        Ok(PriorityOverrideRequest {
            id: row.id,
            ticket_id: row.ticket_id,
            previous_priority: parse_column(
                "priority_override_requests.previous_priority",
                &row.previous_priority,
            )?,
            requested_priority: parse_column(
                "priority_override_requests.requested_priority",
                &row.requested_priority,
            )?,
            reason: row.reason,
            requested_by: row.requested_by,
            status: parse_column("priority_override_requests.status", &row.status)?,
            reviewed_by: row.reviewed_by,
            review_note: row.review_note,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
