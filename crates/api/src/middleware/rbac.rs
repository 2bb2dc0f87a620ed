//! Role-based access control extractors.
//!
//! Each wraps [`AuthUser`] and rejects with 403 when the role is not
//! sufficient.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use servicedesk_core::error::CoreError;
use servicedesk_core::roles::{REVIEWER_ROLES, ROLE_ADMIN, STAFF_ROLES};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed.contains(&user.role.as_str()) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires the `admin` role.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, &[ROLE_ADMIN], "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires `team_lead` or `admin`.
pub struct RequireReviewer(pub AuthUser);

impl FromRequestParts<AppState> for RequireReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, REVIEWER_ROLES, "Team lead or Admin role required")
            .await
            .map(RequireReviewer)
    }
}

/// Requires `agent`, `team_lead` or `admin`.
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, STAFF_ROLES, "Service desk staff role required")
            .await
            .map(RequireStaff)
    }
}
