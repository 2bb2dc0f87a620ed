//! Row model for the `tickets` table.

use sqlx::FromRow;
use servicedesk_core::model::{ticket_number, Ticket};
use servicedesk_core::store::StoreError;
use servicedesk_core::ticket_status::ResolutionFields;
use servicedesk_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    pub requester_id: DbId,
    pub assigned_to: Option<DbId>,
    pub resolution_summary: Option<String>,
    pub resolution_category: Option<String>,
    pub root_cause: Option<String>,
    pub sla_response_due: Option<Timestamp>,
    pub sla_resolution_due: Option<Timestamp>,
    pub sla_started_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub pending_confirmation_since: Option<Timestamp>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            number: ticket_number(row.id),
            title: row.title,
            description: row.description,
            priority: parse_column("tickets.priority", &row.priority)?,
            status: parse_column("tickets.status", &row.status)?,
            requester_id: row.requester_id,
            assigned_to: row.assigned_to,
            resolution: ResolutionFields {
                resolution_summary: row.resolution_summary,
                resolution_category: row.resolution_category,
                root_cause: row.root_cause,
            },
            sla_response_due: row.sla_response_due,
            sla_resolution_due: row.sla_resolution_due,
            sla_started_at: row.sla_started_at,
            resolved_at: row.resolved_at,
            pending_confirmation_since: row.pending_confirmation_since,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
