pub mod jobs;
pub mod overrides;
pub mod sla_rules;
pub mod tickets;
