//! Override review routes mounted at `/priority-overrides`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::overrides;
use crate::state::AppState;

/// ```text
/// GET  /               -> list_overrides (?status=pending)
/// GET  /{id}           -> get_override
/// POST /{id}/review    -> review_override
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overrides::list_overrides))
        .route("/{id}", get(overrides::get_override))
        .route("/{id}/review", post(overrides::review_override))
}
