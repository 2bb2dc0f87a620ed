//! Domain entities shared by the storage, lifecycle, and API layers.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::escalation::{EscalationSeverity, EscalationSource};
use crate::priority::Priority;
use crate::priority_override::OverrideStatus;
use crate::sla::SlaDeadlines;
use crate::ticket_status::{ResolutionFields, TicketStatus};
use crate::types::{DbId, Timestamp};

/// Human-facing ticket number for a ticket id (`TKT-000042`).
pub fn ticket_number(id: DbId) -> String {
    format!("TKT-{id:06}")
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub number: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub requester_id: DbId,
    pub assigned_to: Option<DbId>,
    #[serde(flatten)]
    pub resolution: ResolutionFields,
    pub sla_response_due: Option<Timestamp>,
    pub sla_resolution_due: Option<Timestamp>,
    /// Start of the current SLA clock: creation, or the last reopen.
    pub sla_started_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    /// Set while a resolved ticket waits for the requester to confirm.
    pub pending_confirmation_since: Option<Timestamp>,
    /// Optimistic-concurrency counter, bumped on every write.
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Ticket {
    /// Overwrite both SLA deadlines. `None` clears them.
    pub fn apply_deadlines(&mut self, deadlines: Option<SlaDeadlines>) {
        self.sla_response_due = deadlines.map(|d| d.response_due);
        self.sla_resolution_due = deadlines.map(|d| d.resolution_due);
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.status == TicketStatus::Resolved && self.pending_confirmation_since.is_some()
    }
}

/// Intake data for a new ticket.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTicket {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub priority: Priority,
    pub assigned_to: Option<DbId>,
}

/// Fully prepared ticket row handed to the store for insertion.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub requester_id: DbId,
    pub assigned_to: Option<DbId>,
    pub deadlines: Option<SlaDeadlines>,
    pub created_at: Timestamp,
}

/// Filters for listing tickets. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<DbId>,
    pub requester_id: Option<DbId>,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// Status history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusHistoryEntry {
    pub id: DbId,
    pub ticket_id: DbId,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    /// `None` when the change was made by the system.
    pub changed_by: Option<DbId>,
    pub reason: Option<String>,
    pub changed_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewStatusHistory {
    pub ticket_id: DbId,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    pub changed_by: Option<DbId>,
    pub reason: Option<String>,
    pub changed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Priority changes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityChange {
    pub id: DbId,
    pub ticket_id: DbId,
    pub old_priority: Priority,
    pub new_priority: Priority,
    pub changed_by: Option<DbId>,
    pub override_request_id: Option<DbId>,
    pub changed_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewPriorityChange {
    pub ticket_id: DbId,
    pub old_priority: Priority,
    pub new_priority: Priority,
    pub changed_by: Option<DbId>,
    pub override_request_id: Option<DbId>,
    pub changed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Escalations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Escalation {
    pub id: DbId,
    pub ticket_id: DbId,
    pub severity: EscalationSeverity,
    pub reason: String,
    pub source: EscalationSource,
    pub escalated_by: Option<DbId>,
    /// Percentage of the resolution window consumed (automatic escalations).
    pub elapsed_percent: Option<f64>,
    pub escalated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewEscalation {
    pub ticket_id: DbId,
    pub severity: EscalationSeverity,
    pub reason: String,
    pub source: EscalationSource,
    pub escalated_by: Option<DbId>,
    pub elapsed_percent: Option<f64>,
    pub escalated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Priority override requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityOverrideRequest {
    pub id: DbId,
    pub ticket_id: DbId,
    pub previous_priority: Priority,
    pub requested_priority: Priority,
    pub reason: String,
    pub requested_by: DbId,
    pub status: OverrideStatus,
    pub reviewed_by: Option<DbId>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewOverrideRequest {
    pub ticket_id: DbId,
    pub previous_priority: Priority,
    pub requested_priority: Priority,
    pub reason: String,
    pub requested_by: DbId,
    pub created_at: Timestamp,
}
