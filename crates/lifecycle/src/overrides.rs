//! Priority override requests and their review.
//!
//! A requester asks for a different priority with a justification; a team
//! lead or administrator approves or rejects it. Approval changes the
//! ticket's priority and recomputes its SLA deadlines from the review time.

use std::sync::Arc;

use servicedesk_core::error::CoreError;
use servicedesk_core::model::{NewOverrideRequest, PriorityOverrideRequest, Ticket};
use servicedesk_core::notify::{Actor, Notifier};
use servicedesk_core::priority::Priority;
use servicedesk_core::priority_override::{
    normalize_review_note, validate_request, OverrideDecision, OverrideStatus,
};
use servicedesk_core::store::TicketStore;
use servicedesk_core::types::{DbId, Timestamp};

use crate::tickets::TicketService;

const ENTITY: &str = "PriorityOverrideRequest";

pub struct OverrideWorkflow {
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    tickets: Arc<TicketService>,
}

impl OverrideWorkflow {
    pub fn new(
        store: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        tickets: Arc<TicketService>,
    ) -> Self {
        Self {
            store,
            notifier,
            tickets,
        }
    }

    /// File a new override request for a ticket.
    ///
    /// Fails with `Conflict` while another request for the ticket is still
    /// pending.
    pub async fn request(
        &self,
        ticket_id: DbId,
        requested_priority: Priority,
        reason: &str,
        requested_by: DbId,
        now: Timestamp,
    ) -> Result<PriorityOverrideRequest, CoreError> {
        let ticket = self.tickets.get(ticket_id).await?;

        if let Some(pending) = self.store.find_pending_override(ticket_id).await? {
            return Err(CoreError::Conflict(format!(
                "Ticket {} already has a pending priority override request ({})",
                ticket.number, pending.id
            )));
        }

        let reason = validate_request(ticket.status, ticket.priority, requested_priority, reason)?;
        let request = self
            .store
            .insert_override_request(&NewOverrideRequest {
                ticket_id,
                previous_priority: ticket.priority,
                requested_priority,
                reason,
                requested_by,
                created_at: now,
            })
            .await?;

        tracing::info!(
            request_id = request.id,
            ticket_id,
            from = %ticket.priority,
            to = %requested_priority,
            requested_by,
            "Priority override requested"
        );
        Ok(request)
    }

    /// Approve or reject a pending request.
    ///
    /// A request that does not exist or was already reviewed is reported as
    /// `NotFound`.
    pub async fn review(
        &self,
        request_id: DbId,
        decision: OverrideDecision,
        reviewer_id: DbId,
        note: Option<&str>,
        now: Timestamp,
    ) -> Result<(PriorityOverrideRequest, Ticket), CoreError> {
        let not_found = CoreError::NotFound {
            entity: ENTITY,
            id: request_id,
        };
        let request = match self.store.find_override_request(request_id).await? {
            Some(r) if !r.status.is_terminal() => r,
            _ => return Err(not_found),
        };
        let review_note = normalize_review_note(note)?;

        let mut reviewed = request;
        reviewed.status = decision.resulting_status();
        reviewed.reviewed_by = Some(reviewer_id);
        reviewed.review_note = review_note;
        reviewed.reviewed_at = Some(now);
        reviewed.updated_at = now;

        let ticket = self.tickets.get(reviewed.ticket_id).await?;
        let ticket = match decision {
            // Already at the requested priority: record the decision only.
            OverrideDecision::Approved if ticket.priority == reviewed.requested_priority => {
                self.store.update_override_request(&reviewed).await?;
                ticket
            }
            OverrideDecision::Approved => {
                self.tickets
                    .commit_priority(
                        ticket,
                        reviewed.requested_priority,
                        Actor::User(reviewer_id),
                        Some(&reviewed),
                        now,
                    )
                    .await?
            }
            OverrideDecision::Rejected => {
                self.store.update_override_request(&reviewed).await?;
                ticket
            }
        };

        tracing::info!(
            request_id,
            ticket_id = ticket.id,
            decision = %reviewed.status,
            reviewer_id,
            "Priority override reviewed"
        );
        if let Err(e) = self
            .notifier
            .notify_override_decision(&ticket, &reviewed)
            .await
        {
            tracing::warn!(request_id, error = %e, "Override decision notification failed");
        }

        Ok((reviewed, ticket))
    }

    pub async fn get(&self, request_id: DbId) -> Result<PriorityOverrideRequest, CoreError> {
        self.store
            .find_override_request(request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: ENTITY,
                id: request_id,
            })
    }

    pub async fn list_for_ticket(
        &self,
        ticket_id: DbId,
    ) -> Result<Vec<PriorityOverrideRequest>, CoreError> {
        self.tickets.get(ticket_id).await?;
        Ok(self.store.list_override_requests(Some(ticket_id), None).await?)
    }

    /// The review queue (or any status), newest first.
    pub async fn list(
        &self,
        status: Option<OverrideStatus>,
    ) -> Result<Vec<PriorityOverrideRequest>, CoreError> {
        Ok(self.store.list_override_requests(None, status).await?)
    }
}
