//! Storage seam for the ticket aggregate.
//!
//! The lifecycle services only talk to storage through [`TicketStore`]. The
//! PostgreSQL implementation lives in `servicedesk-db`; an in-memory one is
//! available behind the `test-support` feature.

use async_trait::async_trait;

use crate::model::{
    Escalation, NewEscalation, NewOverrideRequest, NewPriorityChange, NewStatusHistory,
    PriorityChange, PriorityOverrideRequest, StatusHistoryEntry, Ticket, TicketDraft,
    TicketFilter,
};
use crate::priority::Priority;
use crate::priority_override::OverrideStatus;
use crate::sla::SlaRule;
use crate::types::{DbId, Timestamp};

/// Errors surfaced by a [`TicketStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The ticket changed since it was read (compare-and-swap failed).
    #[error("Ticket {ticket_id} was modified concurrently")]
    VersionConflict { ticket_id: DbId },

    /// A uniqueness rule was violated (e.g. a second pending override).
    #[error("Storage conflict: {0}")]
    Conflict(String),

    /// Anything else the backend reports.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Transactional access to tickets and the records they own.
///
/// Every write of a [`Ticket`] is a compare-and-swap on `version`: the
/// stored row must still carry the version the caller read, and the
/// returned ticket carries the bumped version.
#[async_trait]
pub trait TicketStore: Send + Sync {
    // -- SLA catalog ---------------------------------------------------------

    /// The rule for `priority`, only if it is active.
    async fn active_sla_rule(&self, priority: Priority) -> Result<Option<SlaRule>, StoreError>;

    async fn list_sla_rules(&self) -> Result<Vec<SlaRule>, StoreError>;

    /// Insert or replace the rule keyed by `rule.priority`.
    async fn upsert_sla_rule(&self, rule: &SlaRule) -> Result<SlaRule, StoreError>;

    // -- Tickets -------------------------------------------------------------

    async fn insert_ticket(&self, draft: &TicketDraft) -> Result<Ticket, StoreError>;

    async fn read_ticket(&self, id: DbId) -> Result<Option<Ticket>, StoreError>;

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError>;

    /// Persist field changes that carry no audit row (e.g. assignment).
    async fn write_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError>;

    /// Persist a status change and its history row atomically.
    async fn commit_transition(
        &self,
        ticket: &Ticket,
        entry: &NewStatusHistory,
    ) -> Result<(Ticket, StatusHistoryEntry), StoreError>;

    /// Persist a priority change (with recomputed deadlines) and its audit
    /// row atomically. When `request` is given, the reviewed override request
    /// is saved in the same transaction.
    async fn commit_priority_change(
        &self,
        ticket: &Ticket,
        change: &NewPriorityChange,
        request: Option<&PriorityOverrideRequest>,
    ) -> Result<Ticket, StoreError>;

    async fn status_history(&self, ticket_id: DbId) -> Result<Vec<StatusHistoryEntry>, StoreError>;

    async fn priority_changes(&self, ticket_id: DbId) -> Result<Vec<PriorityChange>, StoreError>;

    // -- Scanner queries -----------------------------------------------------

    /// Open tickets (see [`crate::ticket_status::TicketStatus::OPEN`]) that
    /// have a resolution deadline.
    async fn find_open_tickets_with_sla(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Resolved tickets awaiting confirmation for at least `days` calendar
    /// days at `now`.
    async fn find_pending_confirmation_older_than(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError>;

    /// Resolved tickets not awaiting confirmation whose `resolved_at` is at
    /// least `days` business days before `now`.
    async fn find_resolved_older_than_business_days(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError>;

    // -- Escalations ---------------------------------------------------------

    async fn append_escalation(&self, escalation: &NewEscalation) -> Result<Escalation, StoreError>;

    /// Whether an `sla_auto` escalation exists for the ticket at or after
    /// `since`.
    async fn has_auto_escalation_since(
        &self,
        ticket_id: DbId,
        since: Timestamp,
    ) -> Result<bool, StoreError>;

    async fn escalations_for_ticket(&self, ticket_id: DbId) -> Result<Vec<Escalation>, StoreError>;

    // -- Priority override requests -------------------------------------------

    /// Insert a pending request. Fails with [`StoreError::Conflict`] when
    /// the ticket already has a pending request.
    async fn insert_override_request(
        &self,
        request: &NewOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError>;

    /// Save the review outcome of a request.
    async fn update_override_request(
        &self,
        request: &PriorityOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError>;

    async fn find_override_request(
        &self,
        id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError>;

    async fn find_pending_override(
        &self,
        ticket_id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError>;

    /// Requests filtered by ticket and/or status, newest first.
    async fn list_override_requests(
        &self,
        ticket_id: Option<DbId>,
        status: Option<OverrideStatus>,
    ) -> Result<Vec<PriorityOverrideRequest>, StoreError>;
}
