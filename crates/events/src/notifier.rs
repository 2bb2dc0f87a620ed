//! [`Notifier`] implementation that publishes to the event bus.
//!
//! Every notification becomes a [`TicketEvent`] on the bus. Escalations are
//! addressed to the assignee, the requester and the team-lead role, and are
//! additionally mailed to the configured team-lead addresses when SMTP is
//! set up. Delivery failures surface as [`NotifyError`] for the caller to
//! log.

use std::sync::Arc;

use async_trait::async_trait;
use servicedesk_core::model::{Escalation, PriorityOverrideRequest, Ticket};
use servicedesk_core::notify::{Actor, Notifier, NotifyError, StatusChangeNotice};
use servicedesk_core::roles::ROLE_TEAM_LEAD;

use crate::bus::{EventBus, EventKind, TicketEvent};
use crate::delivery::email::EmailDelivery;

pub struct EventNotifier {
    bus: Arc<EventBus>,
    email: Option<EmailDelivery>,
}

impl EventNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus, email: None }
    }

    /// Also mail escalations through `email`.
    pub fn with_email(mut self, email: EmailDelivery) -> Self {
        self.email = Some(email);
        self
    }

    async fn mail_escalation(&self, event: &TicketEvent) -> Result<(), NotifyError> {
        let Some(email) = &self.email else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for to in email.escalation_recipients() {
            if let Err(e) = email.deliver(to, event).await {
                failures.push(format!("{to}: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(failures.join("; ")))
        }
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn notify_status_change(
        &self,
        ticket: &Ticket,
        change: &StatusChangeNotice,
    ) -> Result<(), NotifyError> {
        let event = TicketEvent::new(EventKind::StatusChanged, ticket, ticket.updated_at)
            .with_actor(change.actor)
            .with_payload(serde_json::json!({
                "old_status": change.old_status,
                "new_status": change.new_status,
                "reason": change.reason,
            }));
        self.bus.publish(event);
        Ok(())
    }

    async fn notify_escalation(
        &self,
        ticket: &Ticket,
        escalation: &Escalation,
    ) -> Result<(), NotifyError> {
        let actor = escalation.escalated_by.map_or(Actor::System, Actor::User);
        let event = TicketEvent::new(EventKind::Escalated, ticket, escalation.escalated_at)
            .with_recipient_role(ROLE_TEAM_LEAD)
            .with_actor(actor)
            .with_payload(serde_json::json!({
                "escalation_id": escalation.id,
                "severity": escalation.severity,
                "source": escalation.source,
                "reason": escalation.reason,
                "elapsed_percent": escalation.elapsed_percent,
                "priority": ticket.priority,
                "sla_resolution_due": ticket.sla_resolution_due,
            }));
        self.bus.publish(event.clone());
        self.mail_escalation(&event).await
    }

    async fn notify_override_decision(
        &self,
        ticket: &Ticket,
        request: &PriorityOverrideRequest,
    ) -> Result<(), NotifyError> {
        let mut event = TicketEvent::new(
            EventKind::OverrideReviewed,
            ticket,
            request.reviewed_at.unwrap_or(request.updated_at),
        )
        .with_payload(serde_json::json!({
            "request_id": request.id,
            "status": request.status,
            "previous_priority": request.previous_priority,
            "requested_priority": request.requested_priority,
            "review_note": request.review_note,
        }));
        if let Some(reviewer) = request.reviewed_by {
            event = event.with_actor(Actor::User(reviewer));
        }
        // The decision goes to whoever asked for the override.
        event.recipients = vec![request.requested_by];
        self.bus.publish(event);
        Ok(())
    }
}
