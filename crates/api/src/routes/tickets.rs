//! Ticket routes mounted at `/tickets`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{overrides, tickets};
use crate::state::AppState;

/// ```text
/// GET  /                          -> list_tickets
/// POST /                          -> create_ticket
/// GET  /{id}                      -> get_ticket
/// PUT  /{id}/status               -> transition_ticket
/// POST /{id}/confirm              -> confirm_resolution
/// PUT  /{id}/priority             -> change_priority
/// PUT  /{id}/assignee             -> assign_ticket
/// GET  /{id}/history              -> list_history
/// GET  /{id}/priority-changes     -> list_priority_changes
/// GET  /{id}/escalations          -> list_escalations
/// POST /{id}/escalations          -> escalate_ticket
/// GET  /{id}/priority-overrides   -> list_ticket_overrides
/// POST /{id}/priority-overrides   -> request_override
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/{id}", get(tickets::get_ticket))
        .route("/{id}/status", put(tickets::transition_ticket))
        .route("/{id}/confirm", post(tickets::confirm_resolution))
        .route("/{id}/priority", put(tickets::change_priority))
        .route("/{id}/assignee", put(tickets::assign_ticket))
        .route("/{id}/history", get(tickets::list_history))
        .route("/{id}/priority-changes", get(tickets::list_priority_changes))
        .route(
            "/{id}/escalations",
            get(tickets::list_escalations).post(tickets::escalate_ticket),
        )
        .route(
            "/{id}/priority-overrides",
            get(overrides::list_ticket_overrides).post(overrides::request_override),
        )
}
