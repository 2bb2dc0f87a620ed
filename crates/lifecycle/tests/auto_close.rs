//! Auto-close jobs: unconfirmed resolutions and resolved-ticket aging.

mod common;

use chrono::Duration;
use servicedesk_core::notify::Actor;
use servicedesk_core::priority::Priority;
use servicedesk_core::testing::{MemoryStore, RecordingNotifier, Sent};
use servicedesk_core::ticket_status::TicketStatus;
use servicedesk_lifecycle::{AutoCloseConfig, CloseStats, TransitionRequest};

use common::*;

fn one_business_day() -> Harness {
    build(
        MemoryStore::with_rules(standard_rules()),
        RecordingNotifier::new(),
        AutoCloseConfig {
            pending_confirmation_days: 7,
            resolved_business_days: 1,
        },
    )
}

#[tokio::test]
async fn friday_resolution_closes_on_monday_not_on_the_weekend() {
    let h = one_business_day();
    let friday_morning = utc(2026, 3, 6, 9, 0);
    let friday_evening = utc(2026, 3, 6, 17, 0);
    let ticket = h.open_ticket(Priority::P3, friday_morning).await;
    h.resolve(ticket.id, friday_evening, false).await;

    for weekend in [utc(2026, 3, 7, 9, 0), utc(2026, 3, 8, 23, 59)] {
        let stats = h.desk.auto_close.close_resolved(weekend).await.unwrap();
        assert_eq!(stats, CloseStats::default());
        assert_eq!(h.store.ticket(ticket.id).unwrap().status, TicketStatus::Resolved);
    }

    let monday = utc(2026, 3, 9, 9, 0);
    let stats = h.desk.auto_close.close_resolved(monday).await.unwrap();
    assert_eq!(stats.checked, 1);
    assert_eq!(stats.closed, 1);

    let closed = h.store.ticket(ticket.id).unwrap();
    assert_eq!(closed.status, TicketStatus::Closed);
    assert_eq!(closed.resolved_at, Some(friday_evening));
    assert_eq!(closed.resolution, full_resolution());

    let history = h.desk.tickets.history(ticket.id).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.old_status, TicketStatus::Resolved);
    assert_eq!(last.new_status, TicketStatus::Closed);
    assert_eq!(last.changed_by, None);
    assert_eq!(last.changed_at, monday);

    assert_eq!(
        h.notifier.sent().last(),
        Some(&Sent::StatusChange {
            ticket_id: ticket.id,
            old_status: TicketStatus::Resolved,
            new_status: TicketStatus::Closed,
            actor: Actor::System,
        })
    );
}

#[tokio::test]
async fn second_run_finds_nothing() {
    let h = one_business_day();
    let ticket = h.open_ticket(Priority::P4, t0()).await;
    h.resolve(ticket.id, t0() + Duration::hours(2), false).await;

    let later = t0() + Duration::days(3);
    let first = h.desk.auto_close.close_resolved(later).await.unwrap();
    assert_eq!(first.closed, 1);

    let second = h
        .desk
        .auto_close
        .close_resolved(later + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(second, CloseStats::default());
    assert_eq!(h.desk.tickets.history(ticket.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn default_window_is_three_business_days() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    // Monday morning resolution.
    h.resolve(ticket.id, t0() + Duration::hours(1), false).await;

    let wednesday = utc(2026, 3, 4, 18, 0);
    let stats = h.desk.auto_close.close_resolved(wednesday).await.unwrap();
    assert_eq!(stats.closed, 0);

    let thursday = utc(2026, 3, 5, 0, 30);
    let stats = h.desk.auto_close.close_resolved(thursday).await.unwrap();
    assert_eq!(stats.closed, 1);
}

#[tokio::test]
async fn reopened_ticket_is_left_alone() {
    let h = one_business_day();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    h.resolve(ticket.id, t0() + Duration::hours(1), false).await;
    h.desk
        .tickets
        .transition(
            ticket.id,
            TransitionRequest::to(TicketStatus::Reopened),
            Actor::User(REQUESTER),
            t0() + Duration::hours(3),
        )
        .await
        .unwrap();

    let stats = h
        .desk
        .auto_close
        .close_resolved(t0() + Duration::days(5))
        .await
        .unwrap();
    assert_eq!(stats.checked, 0);
    assert_eq!(h.store.ticket(ticket.id).unwrap().status, TicketStatus::Reopened);
}

#[tokio::test]
async fn unconfirmed_resolution_closes_after_calendar_window() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    let resolved_at = t0() + Duration::hours(1);
    h.resolve(ticket.id, resolved_at, true).await;

    let day_six = resolved_at + Duration::days(6);
    let early = h
        .desk
        .auto_close
        .close_pending_confirmation(day_six)
        .await
        .unwrap();
    assert_eq!(early.checked, 0);

    // Awaiting confirmation is not the business-day policy's concern.
    let other_policy = h.desk.auto_close.close_resolved(day_six).await.unwrap();
    assert_eq!(other_policy.checked, 0);

    let day_seven = resolved_at + Duration::days(7);
    let stats = h
        .desk
        .auto_close
        .close_pending_confirmation(day_seven)
        .await
        .unwrap();
    assert_eq!(stats.closed, 1);

    let closed = h.store.ticket(ticket.id).unwrap();
    assert_eq!(closed.status, TicketStatus::Closed);
    assert!(closed.pending_confirmation_since.is_none());
    let history = h.desk.tickets.history(ticket.id).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.changed_by, None);
    assert!(last.reason.as_deref().unwrap().contains("7 days"));
}

#[tokio::test]
async fn confirmed_ticket_is_not_closed_twice() {
    let h = harness();
    let ticket = h.open_ticket(Priority::P3, t0()).await;
    h.resolve(ticket.id, t0(), true).await;
    h.desk
        .tickets
        .confirm_resolution(ticket.id, REQUESTER, false, t0() + Duration::days(1))
        .await
        .unwrap();

    let stats = h
        .desk
        .auto_close
        .close_pending_confirmation(t0() + Duration::days(8))
        .await
        .unwrap();
    assert_eq!(stats, CloseStats::default());
}

#[tokio::test]
async fn failed_close_is_counted_and_others_proceed() {
    let h = one_business_day();
    let broken = h.open_ticket(Priority::P3, t0()).await;
    let healthy = h.open_ticket(Priority::P3, t0()).await;
    h.resolve(broken.id, t0() + Duration::hours(1), false).await;
    h.resolve(healthy.id, t0() + Duration::hours(1), false).await;
    h.store.fail_writes_for(broken.id);

    let stats = h
        .desk
        .auto_close
        .close_resolved(t0() + Duration::days(2))
        .await
        .unwrap();
    assert_eq!(stats.checked, 2);
    assert_eq!(stats.closed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(h.store.ticket(broken.id).unwrap().status, TicketStatus::Resolved);
    assert_eq!(h.store.ticket(healthy.id).unwrap().status, TicketStatus::Closed);
}
