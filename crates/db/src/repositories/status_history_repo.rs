//! Repository for the append-only `ticket_status_history` table.

use sqlx::{PgExecutor, PgPool};
use servicedesk_core::model::NewStatusHistory;
use servicedesk_core::types::DbId;

use crate::models::status_history::StatusHistoryRow;

/// Column list for `ticket_status_history` queries.
const COLUMNS: &str = "id, ticket_id, old_status, new_status, changed_by, reason, changed_at";

pub struct StatusHistoryRepo;

impl StatusHistoryRepo {
    pub async fn create<'e, E>(
        executor: E,
        entry: &NewStatusHistory,
    ) -> Result<StatusHistoryRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO ticket_status_history \
                (ticket_id, old_status, new_status, changed_by, reason, changed_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StatusHistoryRow>(&query)
            .bind(entry.ticket_id)
            .bind(entry.old_status.as_str())
            .bind(entry.new_status.as_str())
            .bind(entry.changed_by)
            .bind(&entry.reason)
            .bind(entry.changed_at)
            .fetch_one(executor)
            .await
    }

    /// History of one ticket, oldest first.
    pub async fn list_for_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<StatusHistoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ticket_status_history \
             WHERE ticket_id = $1 ORDER BY changed_at ASC, id ASC"
        );
        sqlx::query_as::<_, StatusHistoryRow>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
