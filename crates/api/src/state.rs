use std::sync::Arc;

use servicedesk_core::store::TicketStore;
use servicedesk_lifecycle::ServiceDesk;
use servicedesk_worker::JobScheduler;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Ticket storage, used directly for SLA rule administration and health.
    pub store: Arc<dyn TicketStore>,
    /// Lifecycle services.
    pub desk: ServiceDesk,
    /// Job scheduler; manual runs work whether or not its loops are spawned.
    pub scheduler: Arc<JobScheduler>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Threshold filled in when an SLA rule is saved without one.
    pub fn default_escalation_threshold(&self) -> i32 {
        self.scheduler.config().default_escalation_threshold
    }
}
