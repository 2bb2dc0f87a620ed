pub mod health;
pub mod jobs;
pub mod overrides;
pub mod sla_rules;
pub mod tickets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /tickets                                 list, create
/// /tickets/{id}                            get
/// /tickets/{id}/status                     transition (PUT)
/// /tickets/{id}/confirm                    requester confirmation (POST)
/// /tickets/{id}/priority                   admin priority edit (PUT)
/// /tickets/{id}/assignee                   assign (PUT)
/// /tickets/{id}/history                    status history
/// /tickets/{id}/priority-changes           priority change log
/// /tickets/{id}/escalations                list, manual escalation
/// /tickets/{id}/priority-overrides         list, request
///
/// /priority-overrides                      review queue
/// /priority-overrides/{id}/review          approve or reject (POST)
///
/// /sla-rules                               list
/// /sla-rules/{priority}                    admin upsert (PUT)
///
/// /admin/jobs/{job}/run                    trigger a job now (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tickets", tickets::router())
        .nest("/priority-overrides", overrides::router())
        .nest("/sla-rules", sla_rules::router())
        .nest("/admin/jobs", jobs::router())
}
