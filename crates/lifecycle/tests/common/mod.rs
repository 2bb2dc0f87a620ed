#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use servicedesk_core::model::{NewTicket, Ticket};
use servicedesk_core::notify::{Notifier, Actor};
use servicedesk_core::priority::Priority;
use servicedesk_core::sla::SlaRule;
use servicedesk_core::store::TicketStore;
use servicedesk_core::testing::{MemoryStore, RecordingNotifier};
use servicedesk_core::ticket_status::{ResolutionFields, TicketStatus};
use servicedesk_core::types::Timestamp;
use servicedesk_lifecycle::{AutoCloseConfig, LifecycleSettings, ServiceDesk, TransitionRequest};

pub const REQUESTER: i64 = 100;
pub const AGENT: i64 = 200;
pub const TEAM_LEAD: i64 = 300;

/// Monday 2026-03-02 09:00 UTC.
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn rule(priority: Priority, response: i32, resolution: i32) -> SlaRule {
    SlaRule {
        priority,
        response_time_hours: response,
        resolution_time_hours: resolution,
        escalation_threshold_percent: 80,
        is_active: true,
    }
}

pub fn standard_rules() -> Vec<SlaRule> {
    vec![
        rule(Priority::P1, 1, 4),
        rule(Priority::P2, 4, 8),
        rule(Priority::P3, 8, 24),
        rule(Priority::P4, 24, 72),
    ]
}

pub fn settings(auto_close: AutoCloseConfig) -> LifecycleSettings {
    LifecycleSettings {
        default_escalation_threshold: 80,
        auto_close,
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub desk: ServiceDesk,
}

pub fn harness() -> Harness {
    build(
        MemoryStore::with_rules(standard_rules()),
        RecordingNotifier::new(),
        AutoCloseConfig::default(),
    )
}

pub fn build(
    store: MemoryStore,
    notifier: RecordingNotifier,
    auto_close: AutoCloseConfig,
) -> Harness {
    let store = Arc::new(store);
    let notifier = Arc::new(notifier);
    let desk = ServiceDesk::new(
        Arc::clone(&store) as Arc<dyn TicketStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        settings(auto_close),
    );
    Harness {
        store,
        notifier,
        desk,
    }
}

pub fn full_resolution() -> ResolutionFields {
    ResolutionFields {
        resolution_summary: Some("Replaced faulty docking station".to_string()),
        resolution_category: Some("hardware".to_string()),
        root_cause: Some("Worn USB-C connector".to_string()),
    }
}

impl Harness {
    pub async fn open_ticket(&self, priority: Priority, at: Timestamp) -> Ticket {
        self.desk
            .tickets
            .create(
                NewTicket {
                    title: "Monitor flickers".to_string(),
                    description: Some("Second screen flickers after docking".to_string()),
                    priority,
                    assigned_to: Some(AGENT),
                },
                REQUESTER,
                at,
            )
            .await
            .unwrap()
    }

    pub async fn resolve(&self, ticket_id: i64, at: Timestamp, confirm: bool) -> Ticket {
        let mut request =
            TransitionRequest::to(TicketStatus::Resolved).with_resolution(full_resolution());
        if confirm {
            request = request.awaiting_confirmation();
        }
        self.desk
            .tickets
            .transition(ticket_id, request, Actor::User(AGENT), at)
            .await
            .unwrap()
    }
}
