//! Ticket status state machine and transition rules.
//!
//! Defines the valid ticket statuses, the allowed transitions between them,
//! and the validation helpers the lifecycle services use before persisting a
//! status change. Statuses are stored as their snake_case text form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length for a transition reason (characters).
pub const MAX_REASON_LENGTH: usize = 2_000;

/// Maximum length for each resolution field (characters).
pub const MAX_RESOLUTION_FIELD_LENGTH: usize = 5_000;

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Pending,
    Resolved,
    Closed,
    Reopened,
}

impl TicketStatus {
    /// Statuses whose tickets still run against their SLA clock.
    pub const OPEN: [TicketStatus; 4] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::Pending,
        TicketStatus::Reopened,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
            TicketStatus::Reopened => "reopened",
        }
    }

    /// Whether the ticket is still being worked and can breach its SLA.
    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    /// Whether entering this status requires resolution data.
    pub fn requires_resolution(self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }

    /// Returns the set of statuses this status may transition to.
    ///
    /// Transition rules:
    /// - `new`         -> `in_progress`, `pending`, `resolved`, `closed`
    /// - `in_progress` -> `pending`, `resolved`, `closed`
    /// - `pending`     -> `in_progress`, `resolved`, `closed`
    /// - `resolved`    -> `closed`, `reopened`
    /// - `closed`      -> `reopened`
    /// - `reopened`    -> `in_progress`, `pending`, `resolved`, `closed`
    pub fn valid_transitions(self) -> &'static [TicketStatus] {
        use TicketStatus::*;
        match self {
            New => &[InProgress, Pending, Resolved, Closed],
            InProgress => &[Pending, Resolved, Closed],
            Pending => &[InProgress, Resolved, Closed],
            Resolved => &[Closed, Reopened],
            Closed => &[Reopened],
            Reopened => &[InProgress, Pending, Resolved, Closed],
        }
    }

    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TicketStatus::New),
            "in_progress" => Ok(TicketStatus::InProgress),
            "pending" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            "reopened" => Ok(TicketStatus::Reopened),
            _ => Err(CoreError::Validation(format!(
                "Invalid ticket status '{s}'. Must be one of: new, in_progress, pending, \
                 resolved, closed, reopened"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a status transition from `current` to `next` is allowed.
///
/// Callers handle `current == next` as a no-op before getting here.
pub fn validate_transition(current: TicketStatus, next: TicketStatus) -> Result<(), CoreError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        let allowed: Vec<&str> = current.valid_transitions().iter().map(|s| s.as_str()).collect();
        Err(CoreError::Validation(format!(
            "Cannot transition ticket from '{current}' to '{next}'. Allowed transitions: {}",
            allowed.join(", ")
        )))
    }
}

/// Normalize an optional transition reason: trims, drops empty strings, and
/// enforces [`MAX_REASON_LENGTH`].
pub fn normalize_reason(reason: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Reason exceeds maximum length of {MAX_REASON_LENGTH} characters"
        )));
    }
    Ok(Some(reason.to_string()))
}

/// The three resolution fields required before a ticket may be resolved or
/// closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFields {
    pub resolution_summary: Option<String>,
    pub resolution_category: Option<String>,
    pub root_cause: Option<String>,
}

impl ResolutionFields {
    /// Overlay `other` on top of `self`: any field present in `other` wins.
    pub fn merged_with(&self, other: &ResolutionFields) -> ResolutionFields {
        ResolutionFields {
            resolution_summary: other
                .resolution_summary
                .clone()
                .or_else(|| self.resolution_summary.clone()),
            resolution_category: other
                .resolution_category
                .clone()
                .or_else(|| self.resolution_category.clone()),
            root_cause: other.root_cause.clone().or_else(|| self.root_cause.clone()),
        }
    }

    /// Names of the fields that are missing or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.resolution_summary) {
            missing.push("resolution_summary");
        }
        if blank(&self.resolution_category) {
            missing.push("resolution_category");
        }
        if blank(&self.root_cause) {
            missing.push("root_cause");
        }
        missing
    }
}

/// Enforce the resolution gate for a transition into `next`.
///
/// Entering `resolved` or `closed` requires all three resolution fields to be
/// present and non-blank.
pub fn validate_resolution(next: TicketStatus, fields: &ResolutionFields) -> Result<(), CoreError> {
    if !next.requires_resolution() {
        return Ok(());
    }

    let missing = fields.missing();
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Cannot move ticket to '{next}' without resolution data. Missing: {}",
            missing.join(", ")
        )));
    }

    for value in [
        &fields.resolution_summary,
        &fields.resolution_category,
        &fields.root_cause,
    ]
    .into_iter()
    .flatten()
    {
        if value.chars().count() > MAX_RESOLUTION_FIELD_LENGTH {
            return Err(CoreError::Validation(format!(
                "Resolution fields must not exceed {MAX_RESOLUTION_FIELD_LENGTH} characters"
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
