//! Periodic SLA escalation and auto-close jobs.
//!
//! The [`JobScheduler`] runs inside the standalone worker binary and, when
//! `JOBS_ENABLED` is set, inside the API process too.

pub mod config;
pub mod guard;
pub mod scheduler;

pub use config::JobConfig;
pub use guard::{JobGuard, JobPermit};
pub use scheduler::{JobKind, JobReport, JobScheduler};
