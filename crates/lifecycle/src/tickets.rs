//! Ticket operations and the status transition authority.
//!
//! Every status change in the system, whether requested over HTTP or made by
//! an auto-close job, goes through [`TicketService::apply_transition`]. It
//! validates the move, writes the ticket and its history row in one commit,
//! and then notifies.

use std::sync::Arc;

use serde::Deserialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::escalation::{
    elapsed_fraction, validate_manual_reason, EscalationSeverity, EscalationSource,
};
use servicedesk_core::model::{
    Escalation, NewEscalation, NewPriorityChange, NewStatusHistory, NewTicket, PriorityChange,
    PriorityOverrideRequest, StatusHistoryEntry, Ticket, TicketDraft, TicketFilter,
};
use servicedesk_core::notify::{Actor, Notifier, StatusChangeNotice};
use servicedesk_core::priority::Priority;
use servicedesk_core::store::TicketStore;
use servicedesk_core::ticket_status::{
    normalize_reason, validate_resolution, validate_transition, ResolutionFields, TicketStatus,
};
use servicedesk_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::deadlines::DeadlineCalculator;

/// A requested status change.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: TicketStatus,
    pub reason: Option<String>,
    /// Resolution data; merged over the values already on the ticket.
    #[serde(flatten)]
    pub resolution: ResolutionFields,
    /// When resolving, wait for the requester to confirm before closing.
    #[serde(default)]
    pub request_confirmation: bool,
}

impl TransitionRequest {
    pub fn to(status: TicketStatus) -> Self {
        Self {
            status,
            reason: None,
            resolution: ResolutionFields::default(),
            request_confirmation: false,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionFields) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn awaiting_confirmation(mut self) -> Self {
        self.request_confirmation = true;
        self
    }
}

pub struct TicketService {
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    deadlines: DeadlineCalculator,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>, notifier: Arc<dyn Notifier>) -> Self {
        let deadlines = DeadlineCalculator::new(Arc::clone(&store));
        Self {
            store,
            notifier,
            deadlines,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Load a ticket or fail with `NotFound`.
    pub async fn get(&self, ticket_id: DbId) -> Result<Ticket, CoreError> {
        self.store
            .read_ticket(ticket_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Ticket",
                id: ticket_id,
            })
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, CoreError> {
        Ok(self.store.list_tickets(filter).await?)
    }

    pub async fn history(&self, ticket_id: DbId) -> Result<Vec<StatusHistoryEntry>, CoreError> {
        self.get(ticket_id).await?;
        Ok(self.store.status_history(ticket_id).await?)
    }

    pub async fn priority_changes(&self, ticket_id: DbId) -> Result<Vec<PriorityChange>, CoreError> {
        self.get(ticket_id).await?;
        Ok(self.store.priority_changes(ticket_id).await?)
    }

    pub async fn escalations(&self, ticket_id: DbId) -> Result<Vec<Escalation>, CoreError> {
        self.get(ticket_id).await?;
        Ok(self.store.escalations_for_ticket(ticket_id).await?)
    }

    // -----------------------------------------------------------------------
    // Intake
    // -----------------------------------------------------------------------

    /// Open a new ticket in status `new` with deadlines from the active rule.
    pub async fn create(
        &self,
        input: NewTicket,
        requester_id: DbId,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(format!("Invalid ticket: {e}")))?;
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(CoreError::Validation("Ticket title must not be blank".to_string()));
        }

        let deadlines = self.deadlines.compute(input.priority, now).await?;
        let draft = TicketDraft {
            title,
            description: input.description.filter(|d| !d.trim().is_empty()),
            priority: input.priority,
            requester_id,
            assigned_to: input.assigned_to,
            deadlines,
            created_at: now,
        };
        let ticket = self.store.insert_ticket(&draft).await?;

        tracing::info!(
            ticket_id = ticket.id,
            number = %ticket.number,
            priority = %ticket.priority,
            requester_id,
            "Ticket created"
        );
        Ok(ticket)
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Change the status of a ticket.
    pub async fn transition(
        &self,
        ticket_id: DbId,
        request: TransitionRequest,
        actor: Actor,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        let ticket = self.get(ticket_id).await?;
        self.apply_transition(ticket, request, actor, now).await
    }

    /// Change the status of an already-loaded ticket.
    ///
    /// The write is a compare-and-swap against `ticket.version`, so a ticket
    /// modified since it was read fails with `Conflict` instead of being
    /// overwritten.
    pub async fn apply_transition(
        &self,
        ticket: Ticket,
        request: TransitionRequest,
        actor: Actor,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        let old_status = ticket.status;
        let new_status = request.status;
        if old_status == new_status {
            tracing::debug!(ticket_id = ticket.id, status = %old_status, "Status unchanged, nothing to do");
            return Ok(ticket);
        }

        validate_transition(old_status, new_status)?;
        let reason = normalize_reason(request.reason.as_deref())?;
        let resolution = ticket.resolution.merged_with(&request.resolution);
        validate_resolution(new_status, &resolution)?;

        let mut next = ticket;
        next.status = new_status;
        next.resolution = resolution;
        next.updated_at = now;
        match new_status {
            TicketStatus::Resolved => {
                next.resolved_at = Some(now);
                next.pending_confirmation_since = request.request_confirmation.then_some(now);
            }
            TicketStatus::Closed => {
                next.resolved_at = next.resolved_at.or(Some(now));
                next.pending_confirmation_since = None;
            }
            TicketStatus::Reopened => {
                // A reopened ticket starts a fresh SLA clock.
                next.resolved_at = None;
                next.pending_confirmation_since = None;
                next.sla_started_at = now;
                let deadlines = self.deadlines.compute(next.priority, now).await?;
                next.apply_deadlines(deadlines);
            }
            TicketStatus::New | TicketStatus::InProgress | TicketStatus::Pending => {
                next.pending_confirmation_since = None;
            }
        }

        let entry = NewStatusHistory {
            ticket_id: next.id,
            old_status,
            new_status,
            changed_by: actor.user_id(),
            reason: reason.clone(),
            changed_at: now,
        };
        let (saved, _) = self.store.commit_transition(&next, &entry).await?;

        tracing::info!(
            ticket_id = saved.id,
            from = %old_status,
            to = %new_status,
            %actor,
            "Ticket status changed"
        );

        let notice = StatusChangeNotice {
            old_status,
            new_status,
            actor,
            reason,
        };
        if let Err(e) = self.notifier.notify_status_change(&saved, &notice).await {
            tracing::warn!(ticket_id = saved.id, error = %e, "Status change notification failed");
        }

        Ok(saved)
    }

    /// The requester confirms a resolved ticket, closing it.
    ///
    /// `is_admin` lets an administrator confirm on the requester's behalf.
    pub async fn confirm_resolution(
        &self,
        ticket_id: DbId,
        user_id: DbId,
        is_admin: bool,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        let ticket = self.get(ticket_id).await?;
        if ticket.requester_id != user_id && !is_admin {
            return Err(CoreError::Forbidden(
                "Only the requester can confirm a resolution".to_string(),
            ));
        }
        if ticket.status != TicketStatus::Resolved {
            return Err(CoreError::Validation(format!(
                "Only resolved tickets can be confirmed (ticket is '{}')",
                ticket.status
            )));
        }

        let request =
            TransitionRequest::to(TicketStatus::Closed).with_reason("Resolution confirmed by requester");
        self.apply_transition(ticket, request, Actor::User(user_id), now)
            .await
    }

    // -----------------------------------------------------------------------
    // Priority and assignment
    // -----------------------------------------------------------------------

    /// Administrative priority edit: recomputes deadlines from `now`.
    pub async fn change_priority(
        &self,
        ticket_id: DbId,
        priority: Priority,
        actor: Actor,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        let ticket = self.get(ticket_id).await?;
        if ticket.priority == priority {
            return Ok(ticket);
        }
        self.commit_priority(ticket, priority, actor, None, now).await
    }

    /// Set a new priority, recompute deadlines from `now` and record the
    /// change, optionally together with the override request that caused it.
    ///
    /// Closed tickets keep their priority and deadlines.
    pub(crate) async fn commit_priority(
        &self,
        ticket: Ticket,
        priority: Priority,
        actor: Actor,
        request: Option<&PriorityOverrideRequest>,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        if ticket.status == TicketStatus::Closed {
            return Err(CoreError::Validation(format!(
                "Cannot change the priority of closed ticket {}",
                ticket.number
            )));
        }
        let old_priority = ticket.priority;
        let deadlines = self.deadlines.compute(priority, now).await?;

        let mut next = ticket;
        next.priority = priority;
        next.apply_deadlines(deadlines);
        next.updated_at = now;

        let change = NewPriorityChange {
            ticket_id: next.id,
            old_priority,
            new_priority: priority,
            changed_by: actor.user_id(),
            override_request_id: request.map(|r| r.id),
            changed_at: now,
        };
        let saved = self
            .store
            .commit_priority_change(&next, &change, request)
            .await?;

        tracing::info!(
            ticket_id = saved.id,
            from = %old_priority,
            to = %priority,
            %actor,
            "Ticket priority changed"
        );
        Ok(saved)
    }

    /// Assign (or unassign, with `None`) a ticket.
    pub async fn assign(
        &self,
        ticket_id: DbId,
        assignee: Option<DbId>,
        now: Timestamp,
    ) -> Result<Ticket, CoreError> {
        let ticket = self.get(ticket_id).await?;
        if ticket.assigned_to == assignee {
            return Ok(ticket);
        }
        if ticket.status == TicketStatus::Closed {
            return Err(CoreError::Validation(
                "Cannot reassign a closed ticket".to_string(),
            ));
        }

        let mut next = ticket;
        next.assigned_to = assignee;
        next.updated_at = now;
        let saved = self.store.write_ticket(&next).await?;

        tracing::info!(ticket_id = saved.id, assignee = ?assignee, "Ticket assigned");
        Ok(saved)
    }

    // -----------------------------------------------------------------------
    // Manual escalation
    // -----------------------------------------------------------------------

    /// Record a manual escalation by a staff member.
    pub async fn escalate_manually(
        &self,
        ticket_id: DbId,
        severity: EscalationSeverity,
        reason: &str,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Escalation, CoreError> {
        let ticket = self.get(ticket_id).await?;
        if !ticket.status.is_open() {
            return Err(CoreError::Validation(format!(
                "Only open tickets can be escalated (ticket is '{}')",
                ticket.status
            )));
        }
        let reason = validate_manual_reason(reason)?;

        let elapsed_percent = ticket
            .sla_resolution_due
            .map(|due| elapsed_fraction(ticket.sla_started_at, due, now) * 100.0);
        let escalation = self
            .store
            .append_escalation(&NewEscalation {
                ticket_id,
                severity,
                reason,
                source: EscalationSource::Manual,
                escalated_by: Some(user_id),
                elapsed_percent,
                escalated_at: now,
            })
            .await?;

        tracing::info!(ticket_id, %severity, user_id, "Ticket escalated manually");
        if let Err(e) = self.notifier.notify_escalation(&ticket, &escalation).await {
            tracing::warn!(ticket_id, error = %e, "Escalation notification failed");
        }
        Ok(escalation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_request_deserializes_flat_resolution() {
        let req: TransitionRequest = serde_json::from_value(serde_json::json!({
            "status": "resolved",
            "resolution_summary": "Replaced cable",
            "request_confirmation": true
        }))
        .unwrap();
        assert_eq!(req.status, TicketStatus::Resolved);
        assert_eq!(req.resolution.resolution_summary.as_deref(), Some("Replaced cable"));
        assert!(req.resolution.root_cause.is_none());
        assert!(req.request_confirmation);
    }

    #[test]
    fn confirmation_defaults_to_false() {
        let req: TransitionRequest =
            serde_json::from_value(serde_json::json!({ "status": "in_progress" })).unwrap();
        assert!(!req.request_confirmation);
        assert!(req.reason.is_none());
    }
}
