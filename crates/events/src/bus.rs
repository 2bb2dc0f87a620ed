//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`TicketEvent`]s out to every subscriber. It is shared
//! via `Arc<EventBus>` between the notifier and its consumers.

use std::fmt;

use serde::Serialize;
use servicedesk_core::model::Ticket;
use servicedesk_core::notify::Actor;
use servicedesk_core::types::{DbId, Timestamp};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TicketEvent
// ---------------------------------------------------------------------------

/// What happened to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "ticket.status_changed")]
    StatusChanged,
    #[serde(rename = "ticket.escalated")]
    Escalated,
    #[serde(rename = "priority_override.reviewed")]
    OverrideReviewed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StatusChanged => "ticket.status_changed",
            EventKind::Escalated => "ticket.escalated",
            EventKind::OverrideReviewed => "priority_override.reviewed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event about one ticket.
///
/// Built with [`TicketEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize)]
pub struct TicketEvent {
    pub kind: EventKind,
    pub ticket_id: DbId,
    pub ticket_number: String,
    /// Users interested in the event (requester, assignee), deduplicated.
    pub recipients: Vec<DbId>,
    /// Roles addressed as a group, e.g. every team lead for escalations.
    pub recipient_roles: Vec<String>,
    pub actor: Option<Actor>,
    /// Event-specific data.
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl TicketEvent {
    /// Create an event addressed to the ticket's requester and assignee.
    pub fn new(kind: EventKind, ticket: &Ticket, occurred_at: Timestamp) -> Self {
        let mut recipients = vec![ticket.requester_id];
        if let Some(assignee) = ticket.assigned_to {
            if assignee != ticket.requester_id {
                recipients.push(assignee);
            }
        }
        Self {
            kind,
            ticket_id: ticket.id,
            ticket_number: ticket.number.clone(),
            recipients,
            recipient_roles: Vec::new(),
            actor: None,
            payload: serde_json::Value::Object(Default::default()),
            occurred_at,
        }
    }

    pub fn with_recipient_role(mut self, role: &str) -> Self {
        if !self.recipient_roles.iter().any(|r| r == role) {
            self.recipient_roles.push(role.to_string());
        }
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<TicketEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it; zero when nobody
    /// is listening.
    pub fn publish(&self, event: TicketEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
