//! Repository for the append-only `ticket_priority_changes` table.

use sqlx::{PgExecutor, PgPool};
use servicedesk_core::model::NewPriorityChange;
use servicedesk_core::types::DbId;

use crate::models::priority_change::PriorityChangeRow;

/// Column list for `ticket_priority_changes` queries.
const COLUMNS: &str = "\
    id, ticket_id, old_priority, new_priority, changed_by, override_request_id, changed_at";

pub struct PriorityChangeRepo;

impl PriorityChangeRepo {
    pub async fn create<'e, E>(
        executor: E,
        change: &NewPriorityChange,
    ) -> Result<PriorityChangeRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO ticket_priority_changes \
                (ticket_id, old_priority, new_priority, changed_by, override_request_id, changed_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriorityChangeRow>(&query)
            .bind(change.ticket_id)
            .bind(change.old_priority.as_str())
            .bind(change.new_priority.as_str())
            .bind(change.changed_by)
            .bind(change.override_request_id)
            .bind(change.changed_at)
            .fetch_one(executor)
            .await
    }

    pub async fn list_for_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<PriorityChangeRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ticket_priority_changes \
             WHERE ticket_id = $1 ORDER BY changed_at ASC, id ASC"
        );
        sqlx::query_as::<_, PriorityChangeRow>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
