//! Ticket event bus and outbound notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TicketEvent`]: the event envelope published for every notification.
//! - [`EventNotifier`]: the `Notifier` implementation used by the services;
//!   publishes to the bus and mails escalations when SMTP is configured.
//! - [`EventLogger`]: background subscriber writing every event to the log.

pub mod bus;
pub mod delivery;
pub mod logger;
pub mod notifier;

pub use bus::{EventBus, EventKind, TicketEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use logger::EventLogger;
pub use notifier::EventNotifier;
