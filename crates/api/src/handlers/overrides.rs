//! Handlers for priority override requests and their review.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use servicedesk_core::error::CoreError;
use servicedesk_core::model::{PriorityOverrideRequest, Ticket};
use servicedesk_core::priority::Priority;
use servicedesk_core::priority_override::{OverrideDecision, OverrideStatus};
use servicedesk_core::roles::REVIEWER_ROLES;
use servicedesk_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::tickets::visible_ticket;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireReviewer;
use crate::query::OverrideListParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestOverride {
    pub requested_priority: Priority,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewOverride {
    pub decision: OverrideDecision,
    pub note: Option<String>,
}

/// The reviewed request together with the ticket as it stands afterwards.
#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
    pub request: PriorityOverrideRequest,
    pub ticket: Ticket,
}

/// GET /api/v1/tickets/{id}/priority-overrides
pub async fn list_ticket_overrides(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    visible_ticket(&state, &user, ticket_id).await?;
    let requests = state.desk.overrides.list_for_ticket(ticket_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/tickets/{id}/priority-overrides
///
/// Returns 409 while another request for the ticket is pending.
pub async fn request_override(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<RequestOverride>,
) -> AppResult<impl IntoResponse> {
    visible_ticket(&state, &user, ticket_id).await?;
    let request = state
        .desk
        .overrides
        .request(
            ticket_id,
            input.requested_priority,
            &input.reason,
            user.user_id,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/priority-overrides?status=pending
pub async fn list_overrides(
    RequireReviewer(_reviewer): RequireReviewer,
    State(state): State<AppState>,
    Query(params): Query<OverrideListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OverrideStatus>)
        .transpose()?;
    let requests = state.desk.overrides.list(status).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/priority-overrides/{id}
///
/// Visible to reviewers and to the user who filed the request.
pub async fn get_override(
    user: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = state.desk.overrides.get(request_id).await?;
    if request.requested_by != user.user_id && !REVIEWER_ROLES.contains(&user.role.as_str()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this override request".into(),
        )));
    }
    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/priority-overrides/{id}/review
///
/// Body: `{ "decision": "approved" | "rejected", "note"? }`. Approval
/// recomputes the ticket's SLA deadlines from the time of review.
pub async fn review_override(
    RequireReviewer(reviewer): RequireReviewer,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<ReviewOverride>,
) -> AppResult<impl IntoResponse> {
    let (request, ticket) = state
        .desk
        .overrides
        .review(
            request_id,
            input.decision,
            reviewer.user_id,
            input.note.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok(Json(DataResponse {
        data: ReviewOutcome { request, ticket },
    }))
}
