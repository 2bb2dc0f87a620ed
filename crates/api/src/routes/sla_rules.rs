use axum::routing::{get, put};
use axum::Router;

use crate::handlers::sla_rules;
use crate::state::AppState;

/// SLA catalog routes mounted at `/sla-rules`.
///
/// ```text
/// GET /             -> list_sla_rules
/// PUT /{priority}   -> upsert_sla_rule
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sla_rules::list_sla_rules))
        .route("/{priority}", put(sla_rules::upsert_sla_rule))
}
