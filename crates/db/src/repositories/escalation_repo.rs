//! Repository for the append-only `ticket_escalations` table.

use sqlx::PgPool;
use servicedesk_core::escalation::EscalationSource;
use servicedesk_core::model::NewEscalation;
use servicedesk_core::types::{DbId, Timestamp};

use crate::models::escalation::EscalationRow;

/// Column list for `ticket_escalations` queries.
const COLUMNS: &str = "\
    id, ticket_id, severity, reason, source, escalated_by, elapsed_percent, escalated_at";

pub struct EscalationRepo;

impl EscalationRepo {
    pub async fn create(pool: &PgPool, input: &NewEscalation) -> Result<EscalationRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO ticket_escalations \
                (ticket_id, severity, reason, source, escalated_by, elapsed_percent, escalated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EscalationRow>(&query)
            .bind(input.ticket_id)
            .bind(input.severity.as_str())
            .bind(&input.reason)
            .bind(input.source.as_str())
            .bind(input.escalated_by)
            .bind(input.elapsed_percent)
            .bind(input.escalated_at)
            .fetch_one(pool)
            .await
    }

    /// Whether an automatic escalation was recorded at or after `since`.
    pub async fn exists_auto_since(
        pool: &PgPool,
        ticket_id: DbId,
        since: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM ticket_escalations \
                WHERE ticket_id = $1 AND source = $2 AND escalated_at >= $3 \
             )",
        )
        .bind(ticket_id)
        .bind(EscalationSource::SlaAuto.as_str())
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_for_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<EscalationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ticket_escalations \
             WHERE ticket_id = $1 ORDER BY escalated_at ASC, id ASC"
        );
        sqlx::query_as::<_, EscalationRow>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
