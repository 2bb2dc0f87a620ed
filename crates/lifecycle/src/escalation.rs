//! Periodic SLA escalation scan.
//!
//! For every open ticket with a resolution deadline, the scanner measures
//! how much of the resolution window has been consumed since the SLA clock
//! started. Once that crosses the priority's escalation threshold it records
//! one automatic escalation per SLA epoch and notifies.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::escalation::{
    auto_reason, auto_severity, crosses_threshold, elapsed_fraction, EscalationSource,
};
use servicedesk_core::model::{Escalation, NewEscalation, Ticket};
use servicedesk_core::notify::Notifier;
use servicedesk_core::priority::Priority;
use servicedesk_core::store::TicketStore;
use servicedesk_core::types::Timestamp;
use tracing::{debug, info, instrument, warn};

use crate::error::JobError;

/// Counters for one escalation scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Tickets examined.
    pub checked: usize,
    /// Escalations created.
    pub escalated: usize,
    /// Below threshold or already escalated this epoch.
    pub skipped: usize,
    pub failed: usize,
}

pub struct EscalationScanner {
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    default_threshold: i32,
}

impl EscalationScanner {
    pub fn new(
        store: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        default_threshold: i32,
    ) -> Self {
        Self {
            store,
            notifier,
            default_threshold,
        }
    }

    /// Run one scan over all open tickets.
    ///
    /// Per-ticket failures are logged and counted; only a failure to load
    /// the ticket set aborts the scan.
    #[instrument(skip(self))]
    pub async fn scan(&self, now: Timestamp) -> Result<ScanStats, JobError> {
        let tickets = self
            .store
            .find_open_tickets_with_sla()
            .await
            .map_err(|e| JobError::Scan(e.into()))?;

        let mut stats = ScanStats::default();
        let mut thresholds: HashMap<Priority, i32> = HashMap::new();

        for ticket in &tickets {
            stats.checked += 1;
            match self.check_ticket(ticket, now, &mut thresholds).await {
                Ok(Some(_)) => stats.escalated += 1,
                Ok(None) => stats.skipped += 1,
                Err(source) => {
                    let err = JobError::Transient {
                        ticket_id: ticket.id,
                        source,
                    };
                    warn!(ticket_id = ticket.id, error = %err, "Escalation check failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            checked = stats.checked,
            escalated = stats.escalated,
            skipped = stats.skipped,
            failed = stats.failed,
            "Escalation scan complete"
        );
        Ok(stats)
    }

    async fn check_ticket(
        &self,
        ticket: &Ticket,
        now: Timestamp,
        thresholds: &mut HashMap<Priority, i32>,
    ) -> Result<Option<Escalation>, CoreError> {
        let Some(resolution_due) = ticket.sla_resolution_due else {
            return Ok(None);
        };

        let threshold = self.threshold_for(ticket.priority, thresholds).await?;
        let fraction = elapsed_fraction(ticket.sla_started_at, resolution_due, now);
        if !crosses_threshold(fraction, threshold) {
            return Ok(None);
        }

        if self
            .store
            .has_auto_escalation_since(ticket.id, ticket.sla_started_at)
            .await?
        {
            debug!(ticket_id = ticket.id, "Already escalated in this SLA epoch");
            return Ok(None);
        }

        let severity = auto_severity(fraction);
        let escalation = self
            .store
            .append_escalation(&NewEscalation {
                ticket_id: ticket.id,
                severity,
                reason: auto_reason(fraction, threshold),
                source: EscalationSource::SlaAuto,
                escalated_by: None,
                elapsed_percent: Some(fraction * 100.0),
                escalated_at: now,
            })
            .await?;

        info!(
            ticket_id = ticket.id,
            %severity,
            elapsed_percent = fraction * 100.0,
            threshold,
            "Ticket escalated automatically"
        );
        if let Err(e) = self.notifier.notify_escalation(ticket, &escalation).await {
            warn!(ticket_id = ticket.id, error = %e, "Escalation notification failed");
        }

        Ok(Some(escalation))
    }

    /// Threshold of the active rule, or the configured default.
    async fn threshold_for(
        &self,
        priority: Priority,
        cache: &mut HashMap<Priority, i32>,
    ) -> Result<i32, CoreError> {
        if let Some(threshold) = cache.get(&priority) {
            return Ok(*threshold);
        }
        let threshold = self
            .store
            .active_sla_rule(priority)
            .await?
            .map_or(self.default_threshold, |r| r.escalation_threshold_percent);
        cache.insert(priority, threshold);
        Ok(threshold)
    }
}
