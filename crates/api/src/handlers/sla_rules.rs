use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use servicedesk_core::priority::Priority;
use servicedesk_core::sla::SlaRuleInput;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sla-rules
pub async fn list_sla_rules(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rules = state.store.list_sla_rules().await?;
    Ok(Json(DataResponse { data: rules }))
}

/// PUT /api/v1/sla-rules/{priority}
///
/// Creates or replaces the rule for one priority. Deadlines already stored
/// on tickets are not recomputed.
pub async fn upsert_sla_rule(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(priority): Path<String>,
    Json(input): Json<SlaRuleInput>,
) -> AppResult<impl IntoResponse> {
    let priority: Priority = priority.parse()?;
    let rule = input.into_rule(priority, state.default_escalation_threshold())?;
    let saved = state.store.upsert_sla_rule(&rule).await?;

    tracing::info!(
        %priority,
        response_hours = saved.response_time_hours,
        resolution_hours = saved.resolution_time_hours,
        threshold = saved.escalation_threshold_percent,
        active = saved.is_active,
        user_id = admin.user_id,
        "SLA rule saved"
    );
    Ok(Json(DataResponse { data: saved }))
}
