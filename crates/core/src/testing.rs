//! In-memory [`TicketStore`] and recording [`Notifier`] for tests.
//!
//! Enabled with the `test-support` feature. The store honours the same
//! contracts as the PostgreSQL implementation: compare-and-swap ticket
//! writes, one pending override per ticket, and append-only audit rows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::business_days::{calendar_cutoff, has_elapsed_business_days};
use crate::escalation::{EscalationSeverity, EscalationSource};
use crate::model::{
    ticket_number, Escalation, NewEscalation, NewOverrideRequest, NewPriorityChange,
    NewStatusHistory, PriorityChange, PriorityOverrideRequest, StatusHistoryEntry, Ticket,
    TicketDraft, TicketFilter,
};
use crate::notify::{Actor, Notifier, NotifyError, StatusChangeNotice};
use crate::priority::Priority;
use crate::priority_override::OverrideStatus;
use crate::sla::SlaRule;
use crate::store::{StoreError, TicketStore};
use crate::ticket_status::{ResolutionFields, TicketStatus};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    next_id: DbId,
    rules: HashMap<Priority, SlaRule>,
    tickets: BTreeMap<DbId, Ticket>,
    history: Vec<StatusHistoryEntry>,
    priority_changes: Vec<PriorityChange>,
    escalations: Vec<Escalation>,
    overrides: BTreeMap<DbId, PriorityOverrideRequest>,
    failing_tickets: HashSet<DbId>,
}

impl Inner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn check_failure(&self, ticket_id: DbId) -> Result<(), StoreError> {
        if self.failing_tickets.contains(&ticket_id) {
            Err(StoreError::Backend(format!(
                "simulated failure writing ticket {ticket_id}"
            )))
        } else {
            Ok(())
        }
    }

    fn swap_ticket(&mut self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        self.check_failure(ticket.id)?;
        let stored = self
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| StoreError::Backend(format!("ticket {} does not exist", ticket.id)))?;
        if stored.version != ticket.version {
            return Err(StoreError::VersionConflict {
                ticket_id: ticket.id,
            });
        }
        let mut next = ticket.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the given SLA rules.
    pub fn with_rules(rules: impl IntoIterator<Item = SlaRule>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for rule in rules {
                inner.rules.insert(rule.priority, rule);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every write touching `ticket_id` fail with a backend error.
    pub fn fail_writes_for(&self, ticket_id: DbId) {
        self.lock().failing_tickets.insert(ticket_id);
    }

    pub fn clear_failures(&self) {
        self.lock().failing_tickets.clear();
    }

    /// Overwrite a stored ticket without a version check.
    pub fn put_ticket(&self, ticket: Ticket) {
        self.lock().tickets.insert(ticket.id, ticket);
    }

    pub fn ticket(&self, id: DbId) -> Option<Ticket> {
        self.lock().tickets.get(&id).cloned()
    }

    pub fn all_escalations(&self) -> Vec<Escalation> {
        self.lock().escalations.clone()
    }

    pub fn all_history(&self) -> Vec<StatusHistoryEntry> {
        self.lock().history.clone()
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn active_sla_rule(&self, priority: Priority) -> Result<Option<SlaRule>, StoreError> {
        Ok(self
            .lock()
            .rules
            .get(&priority)
            .filter(|r| r.is_active)
            .cloned())
    }

    async fn list_sla_rules(&self) -> Result<Vec<SlaRule>, StoreError> {
        let mut rules: Vec<SlaRule> = self.lock().rules.values().cloned().collect();
        rules.sort_by_key(|r| r.priority);
        Ok(rules)
    }

    async fn upsert_sla_rule(&self, rule: &SlaRule) -> Result<SlaRule, StoreError> {
        self.lock().rules.insert(rule.priority, rule.clone());
        Ok(rule.clone())
    }

    async fn insert_ticket(&self, draft: &TicketDraft) -> Result<Ticket, StoreError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let ticket = Ticket {
            id,
            number: ticket_number(id),
            title: draft.title.clone(),
            description: draft.description.clone(),
            priority: draft.priority,
            status: TicketStatus::New,
            requester_id: draft.requester_id,
            assigned_to: draft.assigned_to,
            resolution: ResolutionFields::default(),
            sla_response_due: draft.deadlines.map(|d| d.response_due),
            sla_resolution_due: draft.deadlines.map(|d| d.resolution_due),
            sla_started_at: draft.created_at,
            resolved_at: None,
            pending_confirmation_since: None,
            version: 1,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };
        inner.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn read_ticket(&self, id: DbId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock().tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.lock();
        let mut tickets: Vec<Ticket> = inner
            .tickets
            .values()
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
            .filter(|t| filter.assigned_to.map_or(true, |a| t.assigned_to == Some(a)))
            .filter(|t| filter.requester_id.map_or(true, |r| t.requester_id == r))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(filter.offset.max(0)).unwrap_or(0);
        let tickets = tickets.into_iter().skip(offset);
        Ok(if filter.limit > 0 {
            tickets
                .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
                .collect()
        } else {
            tickets.collect()
        })
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        self.lock().swap_ticket(ticket)
    }

    async fn commit_transition(
        &self,
        ticket: &Ticket,
        entry: &NewStatusHistory,
    ) -> Result<(Ticket, StatusHistoryEntry), StoreError> {
        let mut inner = self.lock();
        let saved = inner.swap_ticket(ticket)?;
        let id = inner.next_id();
        let row = StatusHistoryEntry {
            id,
            ticket_id: entry.ticket_id,
            old_status: entry.old_status,
            new_status: entry.new_status,
            changed_by: entry.changed_by,
            reason: entry.reason.clone(),
            changed_at: entry.changed_at,
        };
        inner.history.push(row.clone());
        Ok((saved, row))
    }

    async fn commit_priority_change(
        &self,
        ticket: &Ticket,
        change: &NewPriorityChange,
        request: Option<&PriorityOverrideRequest>,
    ) -> Result<Ticket, StoreError> {
        let mut inner = self.lock();
        if let Some(request) = request {
            match inner.overrides.get(&request.id) {
                Some(stored) if stored.status == OverrideStatus::Pending => {}
                _ => {
                    return Err(StoreError::Conflict(format!(
                        "override request {} is no longer pending",
                        request.id
                    )))
                }
            }
        }
        let saved = inner.swap_ticket(ticket)?;
        let id = inner.next_id();
        inner.priority_changes.push(PriorityChange {
            id,
            ticket_id: change.ticket_id,
            old_priority: change.old_priority,
            new_priority: change.new_priority,
            changed_by: change.changed_by,
            override_request_id: change.override_request_id,
            changed_at: change.changed_at,
        });
        if let Some(request) = request {
            inner.overrides.insert(request.id, request.clone());
        }
        Ok(saved)
    }

    async fn status_history(&self, ticket_id: DbId) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn priority_changes(&self, ticket_id: DbId) -> Result<Vec<PriorityChange>, StoreError> {
        Ok(self
            .lock()
            .priority_changes
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn find_open_tickets_with_sla(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .lock()
            .tickets
            .values()
            .filter(|t| t.status.is_open() && t.sla_resolution_due.is_some())
            .cloned()
            .collect())
    }

    async fn find_pending_confirmation_older_than(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError> {
        let cutoff = calendar_cutoff(now, days);
        Ok(self
            .lock()
            .tickets
            .values()
            .filter(|t| t.status == TicketStatus::Resolved)
            .filter(|t| t.pending_confirmation_since.is_some_and(|since| since <= cutoff))
            .cloned()
            .collect())
    }

    async fn find_resolved_older_than_business_days(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .lock()
            .tickets
            .values()
            .filter(|t| t.status == TicketStatus::Resolved && t.pending_confirmation_since.is_none())
            .filter(|t| {
                t.resolved_at
                    .is_some_and(|resolved| has_elapsed_business_days(resolved, now, days))
            })
            .cloned()
            .collect())
    }

    async fn append_escalation(&self, escalation: &NewEscalation) -> Result<Escalation, StoreError> {
        let mut inner = self.lock();
        inner.check_failure(escalation.ticket_id)?;
        let id = inner.next_id();
        let row = Escalation {
            id,
            ticket_id: escalation.ticket_id,
            severity: escalation.severity,
            reason: escalation.reason.clone(),
            source: escalation.source,
            escalated_by: escalation.escalated_by,
            elapsed_percent: escalation.elapsed_percent,
            escalated_at: escalation.escalated_at,
        };
        inner.escalations.push(row.clone());
        Ok(row)
    }

    async fn has_auto_escalation_since(
        &self,
        ticket_id: DbId,
        since: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(self.lock().escalations.iter().any(|e| {
            e.ticket_id == ticket_id
                && e.source == EscalationSource::SlaAuto
                && e.escalated_at >= since
        }))
    }

    async fn escalations_for_ticket(&self, ticket_id: DbId) -> Result<Vec<Escalation>, StoreError> {
        Ok(self
            .lock()
            .escalations
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn insert_override_request(
        &self,
        request: &NewOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError> {
        let mut inner = self.lock();
        let has_pending = inner
            .overrides
            .values()
            .any(|r| r.ticket_id == request.ticket_id && r.status == OverrideStatus::Pending);
        if has_pending {
            return Err(StoreError::Conflict(format!(
                "ticket {} already has a pending override request",
                request.ticket_id
            )));
        }
        let id = inner.next_id();
        let row = PriorityOverrideRequest {
            id,
            ticket_id: request.ticket_id,
            previous_priority: request.previous_priority,
            requested_priority: request.requested_priority,
            reason: request.reason.clone(),
            requested_by: request.requested_by,
            status: OverrideStatus::Pending,
            reviewed_by: None,
            review_note: None,
            reviewed_at: None,
            created_at: request.created_at,
            updated_at: request.created_at,
        };
        inner.overrides.insert(id, row.clone());
        Ok(row)
    }

    async fn update_override_request(
        &self,
        request: &PriorityOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError> {
        let mut inner = self.lock();
        match inner.overrides.get(&request.id) {
            Some(stored) if stored.status == OverrideStatus::Pending => {
                inner.overrides.insert(request.id, request.clone());
                Ok(request.clone())
            }
            Some(_) => Err(StoreError::Conflict(format!(
                "override request {} is no longer pending",
                request.id
            ))),
            None => Err(StoreError::Backend(format!(
                "override request {} does not exist",
                request.id
            ))),
        }
    }

    async fn find_override_request(
        &self,
        id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError> {
        Ok(self.lock().overrides.get(&id).cloned())
    }

    async fn find_pending_override(
        &self,
        ticket_id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError> {
        Ok(self
            .lock()
            .overrides
            .values()
            .find(|r| r.ticket_id == ticket_id && r.status == OverrideStatus::Pending)
            .cloned())
    }

    async fn list_override_requests(
        &self,
        ticket_id: Option<DbId>,
        status: Option<OverrideStatus>,
    ) -> Result<Vec<PriorityOverrideRequest>, StoreError> {
        Ok(self
            .lock()
            .overrides
            .values()
            .rev()
            .filter(|r| ticket_id.map_or(true, |t| r.ticket_id == t))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// One notification attempt captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    StatusChange {
        ticket_id: DbId,
        old_status: TicketStatus,
        new_status: TicketStatus,
        actor: Actor,
    },
    Escalation {
        ticket_id: DbId,
        severity: EscalationSeverity,
    },
    OverrideDecision {
        request_id: DbId,
        status: OverrideStatus,
    },
}

/// Records every notification attempt; can be switched to fail them all.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails (after being recorded).
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, sent: Sent) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sent);
        if self.failing.load(Ordering::SeqCst) {
            Err(NotifyError::Delivery("simulated delivery failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_status_change(
        &self,
        ticket: &Ticket,
        change: &StatusChangeNotice,
    ) -> Result<(), NotifyError> {
        self.record(Sent::StatusChange {
            ticket_id: ticket.id,
            old_status: change.old_status,
            new_status: change.new_status,
            actor: change.actor,
        })
    }

    async fn notify_escalation(
        &self,
        ticket: &Ticket,
        escalation: &Escalation,
    ) -> Result<(), NotifyError> {
        self.record(Sent::Escalation {
            ticket_id: ticket.id,
            severity: escalation.severity,
        })
    }

    async fn notify_override_decision(
        &self,
        _ticket: &Ticket,
        request: &PriorityOverrideRequest,
    ) -> Result<(), NotifyError> {
        self.record(Sent::OverrideDecision {
            request_id: request.id,
            status: request.status,
        })
    }
}
