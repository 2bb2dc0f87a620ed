//! Notification seam and the actor attributed to a change.
//!
//! Notifications are best-effort: a [`Notifier`] reports failure through
//! [`NotifyError`], and callers log it without undoing the change that
//! triggered the notification.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{Escalation, PriorityOverrideRequest, Ticket};
use crate::ticket_status::TicketStatus;
use crate::types::DbId;

/// Who performed a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    User(DbId),
    /// Background jobs.
    System,
}

impl Actor {
    /// The user id to record, `None` for the system actor.
    pub fn user_id(self) -> Option<DbId> {
        match self {
            Actor::User(id) => Some(id),
            Actor::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::System => f.write_str("system"),
        }
    }
}

/// A status change that has already been persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeNotice {
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    pub actor: Actor,
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the requester and assignee about a new ticket status.
    async fn notify_status_change(
        &self,
        ticket: &Ticket,
        change: &StatusChangeNotice,
    ) -> Result<(), NotifyError>;

    /// Tell the assignee and team leads about an escalation.
    async fn notify_escalation(
        &self,
        ticket: &Ticket,
        escalation: &Escalation,
    ) -> Result<(), NotifyError>;

    /// Tell the requester of an override how it was decided.
    async fn notify_override_decision(
        &self,
        ticket: &Ticket,
        request: &PriorityOverrideRequest,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_actor_has_no_user_id() {
        assert_eq!(Actor::System.user_id(), None);
        assert_eq!(Actor::User(9).user_id(), Some(9));
    }

    #[test]
    fn actor_display() {
        assert_eq!(Actor::System.to_string(), "system");
        assert_eq!(Actor::User(12).to_string(), "user:12");
    }

    #[test]
    fn actor_serializes_tagged() {
        let json = serde_json::to_value(Actor::User(3)).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["user_id"], 3);
        let json = serde_json::to_value(Actor::System).unwrap();
        assert_eq!(json["kind"], "system");
    }
}
