//! Repository for the `priority_override_requests` table.
//!
//! The partial unique index `uq_priority_override_pending` guarantees at
//! most one pending request per ticket; a second insert fails with a
//! unique violation.

use sqlx::{PgExecutor, PgPool};
use servicedesk_core::model::{NewOverrideRequest, PriorityOverrideRequest};
use servicedesk_core::priority_override::OverrideStatus;
use servicedesk_core::types::DbId;

use crate::models::priority_override::PriorityOverrideRow;

/// Column list for `priority_override_requests` queries.
const COLUMNS: &str = "\
    id, ticket_id, previous_priority, requested_priority, reason, requested_by, \
    status, reviewed_by, review_note, reviewed_at, created_at, updated_at";

pub struct PriorityOverrideRepo;

impl PriorityOverrideRepo {
    /// Insert a new pending request.
    pub async fn create(
        pool: &PgPool,
        input: &NewOverrideRequest,
    ) -> Result<PriorityOverrideRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO priority_override_requests \
                (ticket_id, previous_priority, requested_priority, reason, requested_by, \
                 status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriorityOverrideRow>(&query)
            .bind(input.ticket_id)
            .bind(input.previous_priority.as_str())
            .bind(input.requested_priority.as_str())
            .bind(&input.reason)
            .bind(input.requested_by)
            .bind(OverrideStatus::Pending.as_str())
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Record the review outcome. Only applies to a still-pending request;
    /// returns `None` otherwise.
    pub async fn record_review<'e, E>(
        executor: E,
        request: &PriorityOverrideRequest,
    ) -> Result<Option<PriorityOverrideRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE priority_override_requests SET \
                status = $2, reviewed_by = $3, review_note = $4, \
                reviewed_at = $5, updated_at = $6 \
             WHERE id = $1 AND status = $7 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriorityOverrideRow>(&query)
            .bind(request.id)
            .bind(request.status.as_str())
            .bind(request.reviewed_by)
            .bind(&request.review_note)
            .bind(request.reviewed_at)
            .bind(request.updated_at)
            .bind(OverrideStatus::Pending.as_str())
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PriorityOverrideRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM priority_override_requests WHERE id = $1");
        sqlx::query_as::<_, PriorityOverrideRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_pending_for_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Option<PriorityOverrideRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM priority_override_requests \
             WHERE ticket_id = $1 AND status = $2"
        );
        sqlx::query_as::<_, PriorityOverrideRow>(&query)
            .bind(ticket_id)
            .bind(OverrideStatus::Pending.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List requests with optional ticket and status filters, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        ticket_id: Option<DbId>,
        status: Option<OverrideStatus>,
    ) -> Result<Vec<PriorityOverrideRow>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if ticket_id.is_some() {
            conditions.push(format!("ticket_id = ${param_idx}"));
            param_idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM priority_override_requests {where_clause} \
             ORDER BY created_at DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, PriorityOverrideRow>(&query);
        if let Some(ticket_id) = ticket_id {
            q = q.bind(ticket_id);
        }
        if let Some(status) = status {
            q = q.bind(status.as_str());
        }
        q.fetch_all(pool).await
    }
}
