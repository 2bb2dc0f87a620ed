//! Priority override request states and validation.
//!
//! An override request moves `pending -> approved | rejected`; both outcomes
//! are terminal. At most one request per ticket may be pending.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::priority::Priority;
use crate::ticket_status::TicketStatus;

/// Maximum length for an override justification.
pub const MAX_OVERRIDE_REASON_LENGTH: usize = 2_000;

/// Maximum length for a reviewer note.
pub const MAX_REVIEW_NOTE_LENGTH: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Pending,
    Approved,
    Rejected,
}

impl OverrideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverrideStatus::Pending => "pending",
            OverrideStatus::Approved => "approved",
            OverrideStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OverrideStatus::Pending)
    }
}

impl fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverrideStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OverrideStatus::Pending),
            "approved" => Ok(OverrideStatus::Approved),
            "rejected" => Ok(OverrideStatus::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid override status '{s}'. Must be one of: pending, approved, rejected"
            ))),
        }
    }
}

/// A reviewer's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideDecision {
    Approved,
    Rejected,
}

impl OverrideDecision {
    /// The terminal request status this decision produces.
    pub fn resulting_status(self) -> OverrideStatus {
        match self {
            OverrideDecision::Approved => OverrideStatus::Approved,
            OverrideDecision::Rejected => OverrideStatus::Rejected,
        }
    }
}

/// Validate a new override request against the ticket it targets.
///
/// Returns the trimmed justification.
pub fn validate_request(
    ticket_status: TicketStatus,
    current_priority: Priority,
    requested_priority: Priority,
    reason: &str,
) -> Result<String, CoreError> {
    if ticket_status == TicketStatus::Closed {
        return Err(CoreError::Validation(
            "Cannot request a priority override on a closed ticket".to_string(),
        ));
    }

    if requested_priority == current_priority {
        return Err(CoreError::Validation(format!(
            "Ticket already has priority {current_priority}"
        )));
    }

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "A justification is required for a priority override".to_string(),
        ));
    }
    if reason.chars().count() > MAX_OVERRIDE_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Override justification exceeds maximum length of {MAX_OVERRIDE_REASON_LENGTH} characters"
        )));
    }

    Ok(reason.to_string())
}

/// Normalize an optional reviewer note.
pub fn normalize_review_note(note: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if note.chars().count() > MAX_REVIEW_NOTE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review note exceeds maximum length of {MAX_REVIEW_NOTE_LENGTH} characters"
        )));
    }
    Ok(Some(note.to_string()))
}
