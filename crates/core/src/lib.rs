//! Domain types and pure rules for the service-desk ticket engine.
//!
//! Nothing here touches a database or the network. Storage and notification
//! are reached through the [`store::TicketStore`] and [`notify::Notifier`]
//! traits, implemented by the outer crates.

pub mod business_days;
pub mod error;
pub mod escalation;
pub mod model;
pub mod notify;
pub mod priority;
pub mod priority_override;
pub mod roles;
pub mod search;
pub mod sla;
pub mod store;
pub mod ticket_status;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
