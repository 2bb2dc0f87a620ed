//! Structured log sink for ticket events.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes every event to the tracing log. It runs until the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::TicketEvent;

pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop until the channel closes.
    pub async fn run(mut receiver: broadcast::Receiver<TicketEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event = %event.kind,
                        ticket_id = event.ticket_id,
                        ticket_number = %event.ticket_number,
                        recipients = ?event.recipients,
                        recipient_roles = ?event.recipient_roles,
                        actor = ?event.actor,
                        payload = %event.payload,
                        "Ticket event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
    }
}
