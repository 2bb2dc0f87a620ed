use axum::routing::post;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Admin job routes mounted at `/admin/jobs`.
///
/// ```text
/// POST /{job}/run   -> run_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{job}/run", post(jobs::run_job))
}
