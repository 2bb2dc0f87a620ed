//! Priority override requests and reviews.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use servicedesk_core::error::CoreError;
use servicedesk_core::priority::Priority;
use servicedesk_core::priority_override::{OverrideDecision, OverrideStatus};
use servicedesk_core::testing::Sent;
use servicedesk_core::ticket_status::TicketStatus;
use servicedesk_core::notify::Actor;
use servicedesk_lifecycle::TransitionRequest;

use common::*;

const JUSTIFICATION: &str = "Whole finance floor cannot print invoices";

#[tokio::test]
async fn approved_override_recomputes_deadlines_from_review_time() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    assert_eq!(ticket.sla_resolution_due, Some(t0() + Duration::hours(24)));

    let request = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, REQUESTER, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(request.status, OverrideStatus::Pending);
    assert_eq!(request.previous_priority, Priority::P3);

    let reviewed_at = t0() + Duration::hours(10);
    let (reviewed, updated) = h
        .desk
        .overrides
        .review(
            request.id,
            OverrideDecision::Approved,
            TEAM_LEAD,
            Some("  Confirmed with facilities "),
            reviewed_at,
        )
        .await
        .unwrap();

    assert_eq!(reviewed.status, OverrideStatus::Approved);
    assert_eq!(reviewed.reviewed_by, Some(TEAM_LEAD));
    assert_eq!(reviewed.reviewed_at, Some(reviewed_at));
    assert_eq!(reviewed.review_note.as_deref(), Some("Confirmed with facilities"));

    assert_eq!(updated.priority, Priority::P1);
    assert_eq!(updated.sla_response_due, Some(t0() + Duration::hours(11)));
    assert_eq!(updated.sla_resolution_due, Some(t0() + Duration::hours(14)));

    let changes = h.desk.tickets.priority_changes(ticket.id).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].override_request_id, Some(request.id));
    assert_eq!(changes[0].changed_by, Some(TEAM_LEAD));

    let stored = h.desk.overrides.get(request.id).await.unwrap();
    assert_eq!(stored.status, OverrideStatus::Approved);
    assert_eq!(
        h.notifier.sent(),
        vec![Sent::OverrideDecision {
            request_id: request.id,
            status: OverrideStatus::Approved,
        }]
    );
}

#[tokio::test]
async fn rejection_leaves_the_ticket_untouched() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let request = h
        .desk
        .overrides
        .request(ticket.id, Priority::P2, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap();

    let (reviewed, unchanged) = h
        .desk
        .overrides
        .review(request.id, OverrideDecision::Rejected, TEAM_LEAD, None, t0() + Duration::hours(2))
        .await
        .unwrap();

    assert_eq!(reviewed.status, OverrideStatus::Rejected);
    assert!(reviewed.review_note.is_none());
    assert_eq!(unchanged.priority, Priority::P3);
    assert_eq!(unchanged.sla_resolution_due, ticket.sla_resolution_due);
    assert!(h.desk.tickets.priority_changes(ticket.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_one_pending_request_per_ticket() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let first = h
        .desk
        .overrides
        .request(ticket.id, Priority::P2, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap();

    let err = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, AGENT, t0())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    h.desk
        .overrides
        .review(first.id, OverrideDecision::Rejected, TEAM_LEAD, None, t0())
        .await
        .unwrap();

    let second = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, REQUESTER, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_ne!(second.id, first.id);

    let pending = h.desk.overrides.list(Some(OverrideStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);
    assert_eq!(h.desk.overrides.list_for_ticket(ticket.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reviewed_request_cannot_be_reviewed_again() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let request = h
        .desk
        .overrides
        .request(ticket.id, Priority::P2, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap();
    h.desk
        .overrides
        .review(request.id, OverrideDecision::Approved, TEAM_LEAD, None, t0())
        .await
        .unwrap();

    let err = h
        .desk
        .overrides
        .review(request.id, OverrideDecision::Rejected, TEAM_LEAD, None, t0())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotFound {
            entity: "PriorityOverrideRequest",
            ..
        }
    );
    assert_eq!(h.store.ticket(ticket.id).unwrap().priority, Priority::P2);
}

#[tokio::test]
async fn request_validation() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;

    let same = h
        .desk
        .overrides
        .request(ticket.id, Priority::P3, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap_err();
    assert_matches!(same, CoreError::Validation(_));

    let blank = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, "   ", REQUESTER, t0())
        .await
        .unwrap_err();
    assert_matches!(blank, CoreError::Validation(_));

    let missing = h
        .desk
        .overrides
        .request(424242, Priority::P1, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap_err();
    assert_matches!(missing, CoreError::NotFound { entity: "Ticket", .. });
}

#[tokio::test]
async fn closed_ticket_cannot_be_overridden() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    h.resolve(ticket.id, t0() + Duration::hours(1), false).await;
    h.desk
        .tickets
        .transition(
            ticket.id,
            TransitionRequest::to(TicketStatus::Closed),
            Actor::User(AGENT),
            t0() + Duration::hours(2),
        )
        .await
        .unwrap();

    let err = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, REQUESTER, t0() + Duration::hours(3))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn approval_at_current_priority_keeps_deadlines() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let request = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap();

    // An admin raises the priority directly before the review happens.
    let raised = h
        .desk
        .tickets
        .change_priority(ticket.id, Priority::P1, Actor::User(TEAM_LEAD), t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(raised.sla_resolution_due, Some(t0() + Duration::hours(5)));

    let (reviewed, updated) = h
        .desk
        .overrides
        .review(request.id, OverrideDecision::Approved, TEAM_LEAD, None, t0() + Duration::hours(4))
        .await
        .unwrap();

    assert_eq!(reviewed.status, OverrideStatus::Approved);
    assert_eq!(updated.priority, Priority::P1);
    assert_eq!(updated.sla_response_due, raised.sla_response_due);
    assert_eq!(updated.sla_resolution_due, raised.sla_resolution_due);

    let changes = h.desk.tickets.priority_changes(ticket.id).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old_priority, Priority::P3);
    assert!(changes[0].override_request_id.is_none());
    assert_eq!(
        h.desk.overrides.get(request.id).await.unwrap().status,
        OverrideStatus::Approved
    );
}

#[tokio::test]
async fn approval_after_close_is_refused() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let request = h
        .desk
        .overrides
        .request(ticket.id, Priority::P1, JUSTIFICATION, REQUESTER, t0())
        .await
        .unwrap();
    let closed = h
        .desk
        .tickets
        .transition(
            ticket.id,
            TransitionRequest::to(TicketStatus::Closed).with_resolution(full_resolution()),
            Actor::User(AGENT),
            t0() + Duration::hours(1),
        )
        .await
        .unwrap();

    let err = h
        .desk
        .overrides
        .review(request.id, OverrideDecision::Approved, TEAM_LEAD, None, t0() + Duration::hours(2))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let stored = h.store.ticket(ticket.id).unwrap();
    assert_eq!(stored.status, TicketStatus::Closed);
    assert_eq!(stored.priority, Priority::P3);
    assert_eq!(stored.sla_resolution_due, closed.sla_resolution_due);
    assert!(h.desk.tickets.priority_changes(ticket.id).await.unwrap().is_empty());

    // The request stays open for a rejection.
    let (rejected, _) = h
        .desk
        .overrides
        .review(request.id, OverrideDecision::Rejected, TEAM_LEAD, None, t0() + Duration::hours(3))
        .await
        .unwrap();
    assert_eq!(rejected.status, OverrideStatus::Rejected);
}
