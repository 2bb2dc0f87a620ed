use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use servicedesk_core::error::CoreError;
use servicedesk_worker::JobKind;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/jobs/{job}/run
///
/// Runs `escalation`, `pending-confirmation` or `resolved` immediately and
/// returns its stats. 409 if that job is already running.
pub async fn run_job(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(job): Path<String>,
) -> AppResult<impl IntoResponse> {
    let kind: JobKind = job.parse()?;
    tracing::info!(job = %kind, user_id = admin.user_id, "Manual job run requested");

    match state.scheduler.run_now(kind).await {
        Ok(Some(report)) => Ok(Json(DataResponse { data: report })),
        Ok(None) => Err(AppError::Core(CoreError::Conflict(format!(
            "Job '{kind}' is already running"
        )))),
        Err(e) => Err(AppError::InternalError(e.to_string())),
    }
}
