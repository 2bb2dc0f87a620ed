//! Auto-close policies for resolved tickets.
//!
//! - Pending confirmation: a ticket resolved with a confirmation request is
//!   closed once the requester has not answered for N calendar days.
//! - Resolved: a ticket resolved without a confirmation request is closed
//!   after N business days.
//!
//! Both close through [`TicketService::apply_transition`] as the system
//! actor, so history and notifications match a manual close.

use std::sync::Arc;

use serde::Serialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::model::Ticket;
use servicedesk_core::notify::Actor;
use servicedesk_core::store::TicketStore;
use servicedesk_core::ticket_status::{ResolutionFields, TicketStatus};
use servicedesk_core::types::Timestamp;
use tracing::{info, instrument, warn};

use crate::error::JobError;
use crate::tickets::{TicketService, TransitionRequest};

/// Category recorded when a job had to fill in a missing category.
pub const AUTO_CLOSED_CATEGORY: &str = "auto_closed";

const UNSPECIFIED_ROOT_CAUSE: &str = "Not specified";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoCloseConfig {
    /// Calendar days a resolved ticket may await confirmation.
    pub pending_confirmation_days: i64,
    /// Business days a resolved ticket stays open without confirmation.
    pub resolved_business_days: i64,
}

impl Default for AutoCloseConfig {
    fn default() -> Self {
        Self {
            pending_confirmation_days: 7,
            resolved_business_days: 3,
        }
    }
}

/// Counters for one auto-close run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CloseStats {
    pub checked: usize,
    pub closed: usize,
    /// Tickets changed by someone else since the query.
    pub skipped: usize,
    pub failed: usize,
}

/// Fill blank resolution fields with system-provided values.
///
/// Fields the ticket already carries are kept.
pub fn fill_missing_resolution(stored: &ResolutionFields, summary: &str) -> ResolutionFields {
    let keep = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    ResolutionFields {
        resolution_summary: keep(&stored.resolution_summary).or_else(|| Some(summary.to_string())),
        resolution_category: keep(&stored.resolution_category)
            .or_else(|| Some(AUTO_CLOSED_CATEGORY.to_string())),
        root_cause: keep(&stored.root_cause).or_else(|| Some(UNSPECIFIED_ROOT_CAUSE.to_string())),
    }
}

pub struct AutoCloser {
    store: Arc<dyn TicketStore>,
    tickets: Arc<TicketService>,
    config: AutoCloseConfig,
}

impl AutoCloser {
    pub fn new(
        store: Arc<dyn TicketStore>,
        tickets: Arc<TicketService>,
        config: AutoCloseConfig,
    ) -> Self {
        Self {
            store,
            tickets,
            config,
        }
    }

    pub fn config(&self) -> AutoCloseConfig {
        self.config
    }

    /// Close tickets whose confirmation window has run out.
    #[instrument(skip(self))]
    pub async fn close_pending_confirmation(&self, now: Timestamp) -> Result<CloseStats, JobError> {
        let days = self.config.pending_confirmation_days;
        let tickets = self
            .store
            .find_pending_confirmation_older_than(days, now)
            .await
            .map_err(|e| JobError::Scan(e.into()))?;

        let reason = format!("Automatically closed: no confirmation from the requester within {days} days");
        let stats = self.close_all(tickets, &reason, now).await;
        info!(
            checked = stats.checked,
            closed = stats.closed,
            skipped = stats.skipped,
            failed = stats.failed,
            "Pending-confirmation auto-close complete"
        );
        Ok(stats)
    }

    /// Close resolved tickets left untouched for the business-day window.
    #[instrument(skip(self))]
    pub async fn close_resolved(&self, now: Timestamp) -> Result<CloseStats, JobError> {
        let days = self.config.resolved_business_days;
        let tickets = self
            .store
            .find_resolved_older_than_business_days(days, now)
            .await
            .map_err(|e| JobError::Scan(e.into()))?;

        let reason = format!("Automatically closed: resolved for {days} business days");
        let stats = self.close_all(tickets, &reason, now).await;
        info!(
            checked = stats.checked,
            closed = stats.closed,
            skipped = stats.skipped,
            failed = stats.failed,
            "Resolved-ticket auto-close complete"
        );
        Ok(stats)
    }

    async fn close_all(&self, tickets: Vec<Ticket>, reason: &str, now: Timestamp) -> CloseStats {
        let mut stats = CloseStats::default();

        for ticket in tickets {
            stats.checked += 1;
            let ticket_id = ticket.id;
            if ticket.status != TicketStatus::Resolved {
                stats.skipped += 1;
                continue;
            }

            let request = TransitionRequest::to(TicketStatus::Closed)
                .with_reason(reason)
                .with_resolution(fill_missing_resolution(&ticket.resolution, reason));

            match self
                .tickets
                .apply_transition(ticket, request, Actor::System, now)
                .await
            {
                Ok(_) => stats.closed += 1,
                Err(CoreError::Conflict(msg)) => {
                    info!(ticket_id, reason = %msg, "Ticket changed during auto-close, skipping");
                    stats.skipped += 1;
                }
                Err(source) => {
                    let err = JobError::Transient { ticket_id, source };
                    warn!(ticket_id, error = %err, "Auto-close failed");
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}
