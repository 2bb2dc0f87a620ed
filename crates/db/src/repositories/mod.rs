//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; writes that must join a transaction accept any
//! `PgExecutor`, so callers can pass either the pool or `&mut *tx`.

pub mod escalation_repo;
pub mod priority_change_repo;
pub mod priority_override_repo;
pub mod sla_rule_repo;
pub mod status_history_repo;
pub mod ticket_repo;

pub use escalation_repo::EscalationRepo;
pub use priority_change_repo::PriorityChangeRepo;
pub use priority_override_repo::PriorityOverrideRepo;
pub use sla_rule_repo::SlaRuleRepo;
pub use status_history_repo::StatusHistoryRepo;
pub use ticket_repo::TicketRepo;
