//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`]: the authenticated user from a Bearer token.
//! - [`rbac::RequireStaff`]: agent, team lead or admin.
//! - [`rbac::RequireReviewer`]: team lead or admin.
//! - [`rbac::RequireAdmin`]: admin only.

pub mod auth;
pub mod rbac;
