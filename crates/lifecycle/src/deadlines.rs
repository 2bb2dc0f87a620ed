//! SLA deadline lookup.

use std::sync::Arc;

use servicedesk_core::error::CoreError;
use servicedesk_core::priority::Priority;
use servicedesk_core::sla::{compute_deadlines, SlaDeadlines};
use servicedesk_core::store::TicketStore;
use servicedesk_core::types::Timestamp;

/// Computes deadlines from the active SLA rule of a priority.
#[derive(Clone)]
pub struct DeadlineCalculator {
    store: Arc<dyn TicketStore>,
}

impl DeadlineCalculator {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Deadlines for a ticket of `priority` whose SLA clock starts at `from`.
    ///
    /// `None` when the priority has no active rule.
    pub async fn compute(
        &self,
        priority: Priority,
        from: Timestamp,
    ) -> Result<Option<SlaDeadlines>, CoreError> {
        let rule = self.store.active_sla_rule(priority).await?;
        let deadlines = compute_deadlines(rule.as_ref(), from);
        if deadlines.is_none() {
            tracing::info!(%priority, "No active SLA rule, ticket will have no deadlines");
        }
        Ok(deadlines)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use servicedesk_core::sla::SlaRule;
    use servicedesk_core::testing::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn inactive_rule_yields_no_deadlines() {
        let store = Arc::new(MemoryStore::with_rules([SlaRule {
            priority: Priority::P4,
            response_time_hours: 24,
            resolution_time_hours: 72,
            escalation_threshold_percent: 80,
            is_active: false,
        }]));
        let calc = DeadlineCalculator::new(store);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert_eq!(calc.compute(Priority::P4, now).await.unwrap(), None);
        assert_eq!(calc.compute(Priority::P1, now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn active_rule_offsets_from_start() {
        let store = Arc::new(MemoryStore::with_rules([SlaRule {
            priority: Priority::P2,
            response_time_hours: 4,
            resolution_time_hours: 8,
            escalation_threshold_percent: 75,
            is_active: true,
        }]));
        let calc = DeadlineCalculator::new(store);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let d = calc.compute(Priority::P2, now).await.unwrap().unwrap();
        assert_eq!(d.response_due, now + Duration::hours(4));
        assert_eq!(d.resolution_due, now + Duration::hours(8));
    }
}
