//! Timer loops for the escalation and auto-close jobs.
//!
//! Each job has its own [`JobGuard`]; a tick that finds the previous run
//! still in progress is skipped rather than queued. Runs are spawned off
//! the timer loop so ticks keep firing while a slow scan is in flight.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::types::Timestamp;
use servicedesk_lifecycle::{CloseStats, JobError, ScanStats, ServiceDesk};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::JobConfig;
use crate::guard::JobGuard;

/// The three periodic jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Escalation,
    PendingConfirmation,
    Resolved,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [
        JobKind::Escalation,
        JobKind::PendingConfirmation,
        JobKind::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Escalation => "escalation",
            JobKind::PendingConfirmation => "pending-confirmation",
            JobKind::Resolved => "resolved",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "escalation" => Ok(JobKind::Escalation),
            "pending-confirmation" => Ok(JobKind::PendingConfirmation),
            "resolved" => Ok(JobKind::Resolved),
            _ => Err(CoreError::Validation(format!(
                "Unknown job '{s}'. Must be one of: escalation, pending-confirmation, resolved"
            ))),
        }
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "job", content = "stats", rename_all = "kebab-case")]
pub enum JobReport {
    Escalation(ScanStats),
    PendingConfirmation(CloseStats),
    Resolved(CloseStats),
}

pub struct JobScheduler {
    desk: ServiceDesk,
    config: JobConfig,
    escalation: JobGuard,
    pending_confirmation: JobGuard,
    resolved: JobGuard,
}

impl JobScheduler {
    pub fn new(desk: ServiceDesk, config: JobConfig) -> Self {
        Self {
            desk,
            config,
            escalation: JobGuard::new(),
            pending_confirmation: JobGuard::new(),
            resolved: JobGuard::new(),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    fn guard(&self, kind: JobKind) -> &JobGuard {
        match kind {
            JobKind::Escalation => &self.escalation,
            JobKind::PendingConfirmation => &self.pending_confirmation,
            JobKind::Resolved => &self.resolved,
        }
    }

    fn interval(&self, kind: JobKind) -> Duration {
        match kind {
            JobKind::Escalation => self.config.escalation_interval,
            JobKind::PendingConfirmation | JobKind::Resolved => self.config.auto_close_interval,
        }
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.guard(kind).is_running()
    }

    /// Run a job immediately, through the same guard as the timer loop.
    ///
    /// Returns `Ok(None)` when a run of that job is already in progress.
    pub async fn run_now(&self, kind: JobKind) -> Result<Option<JobReport>, JobError> {
        self.run_at(kind, Utc::now()).await
    }

    /// [`run_now`](Self::run_now) with an explicit clock.
    pub async fn run_at(
        &self,
        kind: JobKind,
        now: Timestamp,
    ) -> Result<Option<JobReport>, JobError> {
        let Some(_permit) = self.guard(kind).try_acquire() else {
            tracing::info!(job = %kind, "Job already running, not starting another run");
            return Ok(None);
        };
        self.execute(kind, now).await.map(Some)
    }

    async fn execute(&self, kind: JobKind, now: Timestamp) -> Result<JobReport, JobError> {
        match kind {
            JobKind::Escalation => self
                .desk
                .escalations
                .scan(now)
                .await
                .map(JobReport::Escalation),
            JobKind::PendingConfirmation => self
                .desk
                .auto_close
                .close_pending_confirmation(now)
                .await
                .map(JobReport::PendingConfirmation),
            JobKind::Resolved => self
                .desk
                .auto_close
                .close_resolved(now)
                .await
                .map(JobReport::Resolved),
        }
    }

    /// Start one timer loop per job. The loops exit when `cancel` fires;
    /// runs already in flight are not waited for.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        JobKind::ALL
            .into_iter()
            .map(|kind| tokio::spawn(Arc::clone(self).run_loop(kind, cancel.clone())))
            .collect()
    }

    async fn run_loop(self: Arc<Self>, kind: JobKind, cancel: CancellationToken) {
        let period = self.interval(kind);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(job = %kind, interval_secs = period.as_secs(), "Job loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job = %kind, "Job loop stopping");
                    break;
                }
                _ = interval.tick() => {
                    let Some(permit) = self.guard(kind).try_acquire() else {
                        tracing::info!(job = %kind, "Previous run still running, skipping");
                        continue;
                    };
                    let scheduler = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = scheduler.execute(kind, Utc::now()).await {
                            tracing::error!(job = %kind, error = %e, "Job run failed");
                        }
                    });
                }
            }
        }
    }
}
