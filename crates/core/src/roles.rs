//! Well-known role name constants.
//!
//! These must match the `role` claim issued in access tokens.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEAM_LEAD: &str = "team_lead";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_REQUESTER: &str = "requester";

/// Roles allowed to work tickets (transition, assign, escalate).
pub const STAFF_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_TEAM_LEAD, ROLE_AGENT];

/// Roles allowed to review priority override requests.
pub const REVIEWER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_TEAM_LEAD];
