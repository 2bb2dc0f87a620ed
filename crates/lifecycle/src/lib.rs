//! Ticket lifecycle orchestration.
//!
//! Services here combine the pure rules from `servicedesk-core` with a
//! [`TicketStore`] and a [`Notifier`]:
//!
//! - [`TicketService`]: the status transition authority plus the other
//!   ticket operations (create, assign, priority edits, manual escalation).
//! - [`OverrideWorkflow`]: priority override requests and their review.
//! - [`EscalationScanner`]: periodic SLA consumption check.
//! - [`AutoCloser`]: the two resolved-ticket auto-close policies.
//!
//! Every operation takes the current time explicitly.

pub mod auto_close;
pub mod deadlines;
pub mod error;
pub mod escalation;
pub mod overrides;
pub mod tickets;

use std::sync::Arc;

use servicedesk_core::notify::Notifier;
use servicedesk_core::store::TicketStore;

pub use auto_close::{AutoCloseConfig, AutoCloser, CloseStats};
pub use deadlines::DeadlineCalculator;
pub use error::JobError;
pub use escalation::{EscalationScanner, ScanStats};
pub use overrides::OverrideWorkflow;
pub use tickets::{TicketService, TransitionRequest};

/// Tunables shared by the services and scanners.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    /// Threshold used when a ticket's priority has no active rule.
    pub default_escalation_threshold: i32,
    pub auto_close: AutoCloseConfig,
}

/// All lifecycle services wired to one store and notifier.
#[derive(Clone)]
pub struct ServiceDesk {
    pub tickets: Arc<TicketService>,
    pub overrides: Arc<OverrideWorkflow>,
    pub escalations: Arc<EscalationScanner>,
    pub auto_close: Arc<AutoCloser>,
}

impl ServiceDesk {
    pub fn new(
        store: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        settings: LifecycleSettings,
    ) -> Self {
        let tickets = Arc::new(TicketService::new(Arc::clone(&store), Arc::clone(&notifier)));
        let overrides = Arc::new(OverrideWorkflow::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&tickets),
        ));
        let escalations = Arc::new(EscalationScanner::new(
            Arc::clone(&store),
            notifier,
            settings.default_escalation_threshold,
        ));
        let auto_close = Arc::new(AutoCloser::new(
            store,
            Arc::clone(&tickets),
            settings.auto_close,
        ));
        Self {
            tickets,
            overrides,
            escalations,
            auto_close,
        }
    }
}
