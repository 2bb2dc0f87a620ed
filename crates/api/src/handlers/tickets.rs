//! Handlers for tickets and their history, escalations and assignment.
//!
//! Requesters see only their own tickets; staff see all of them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::escalation::EscalationSeverity;
use servicedesk_core::model::{NewTicket, Ticket};
use servicedesk_core::notify::Actor;
use servicedesk_core::priority::Priority;
use servicedesk_core::types::DbId;
use servicedesk_lifecycle::TransitionRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::query::TicketListParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePriority {
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct AssignTicket {
    /// `null` unassigns.
    pub assigned_to: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct ManualEscalation {
    pub severity: EscalationSeverity,
    pub reason: String,
}

/// Load a ticket the user is allowed to see.
pub(crate) async fn visible_ticket(
    state: &AppState,
    user: &AuthUser,
    ticket_id: DbId,
) -> AppResult<Ticket> {
    let ticket = state.desk.tickets.get(ticket_id).await?;
    if !user.is_staff() && ticket.requester_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this ticket".into(),
        )));
    }
    Ok(ticket)
}

/// POST /api/v1/tickets
pub async fn create_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewTicket>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .desk
        .tickets
        .create(input, user.user_id, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

/// GET /api/v1/tickets
///
/// Filters: `status`, `priority`, `assigned_to`, `requester_id`, `limit`,
/// `offset`. A requester's list is always limited to their own tickets.
pub async fn list_tickets(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TicketListParams>,
) -> AppResult<impl IntoResponse> {
    let mut filter = params.into_filter()?;
    if !user.is_staff() {
        filter.requester_id = Some(user.user_id);
    }
    let tickets = state.desk.tickets.list(&filter).await?;

    Ok(Json(DataResponse { data: tickets }))
}

/// GET /api/v1/tickets/{id}
pub async fn get_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ticket = visible_ticket(&state, &user, ticket_id).await?;
    Ok(Json(DataResponse { data: ticket }))
}

/// PUT /api/v1/tickets/{id}/status
///
/// Body: `{ "status", "reason"?, "resolution_summary"?, "resolution_category"?,
/// "root_cause"?, "request_confirmation"? }`.
pub async fn transition_ticket(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(request): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .desk
        .tickets
        .transition(ticket_id, request, Actor::User(user.user_id), Utc::now())
        .await?;

    Ok(Json(DataResponse { data: ticket }))
}

/// POST /api/v1/tickets/{id}/confirm
///
/// The requester accepts the resolution; admins may confirm on their behalf.
pub async fn confirm_resolution(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .desk
        .tickets
        .confirm_resolution(ticket_id, user.user_id, user.is_admin(), Utc::now())
        .await?;

    Ok(Json(DataResponse { data: ticket }))
}

/// PUT /api/v1/tickets/{id}/priority
pub async fn change_priority(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<ChangePriority>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .desk
        .tickets
        .change_priority(
            ticket_id,
            input.priority,
            Actor::User(admin.user_id),
            Utc::now(),
        )
        .await?;

    Ok(Json(DataResponse { data: ticket }))
}

/// PUT /api/v1/tickets/{id}/assignee
pub async fn assign_ticket(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<AssignTicket>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .desk
        .tickets
        .assign(ticket_id, input.assigned_to, Utc::now())
        .await?;

    tracing::info!(ticket_id, user_id = user.user_id, "Assignment updated via API");
    Ok(Json(DataResponse { data: ticket }))
}

/// GET /api/v1/tickets/{id}/history
pub async fn list_history(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    visible_ticket(&state, &user, ticket_id).await?;
    let history = state.desk.tickets.history(ticket_id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/tickets/{id}/priority-changes
pub async fn list_priority_changes(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    visible_ticket(&state, &user, ticket_id).await?;
    let changes = state.desk.tickets.priority_changes(ticket_id).await?;
    Ok(Json(DataResponse { data: changes }))
}

/// GET /api/v1/tickets/{id}/escalations
pub async fn list_escalations(
    user: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    visible_ticket(&state, &user, ticket_id).await?;
    let escalations = state.desk.tickets.escalations(ticket_id).await?;
    Ok(Json(DataResponse { data: escalations }))
}

/// POST /api/v1/tickets/{id}/escalations
pub async fn escalate_ticket(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<ManualEscalation>,
) -> AppResult<impl IntoResponse> {
    let escalation = state
        .desk
        .tickets
        .escalate_manually(
            ticket_id,
            input.severity,
            &input.reason,
            user.user_id,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: escalation })))
}
