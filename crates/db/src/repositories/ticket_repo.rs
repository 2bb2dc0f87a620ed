//! Repository for the `tickets` table.
//!
//! Ticket updates are compare-and-swap on the `version` column: an update
//! only applies when the stored version still matches the one the caller
//! read, and bumps it by one.

use sqlx::{PgExecutor, PgPool};
use servicedesk_core::model::{Ticket, TicketDraft, TicketFilter};
use servicedesk_core::ticket_status::TicketStatus;
use servicedesk_core::types::{DbId, Timestamp};

use crate::models::ticket::TicketRow;

/// Column list for `tickets` queries.
const COLUMNS: &str = "\
    id, title, description, priority, status, requester_id, assigned_to, \
    resolution_summary, resolution_category, root_cause, \
    sla_response_due, sla_resolution_due, sla_started_at, \
    resolved_at, pending_confirmation_since, version, created_at, updated_at";

/// Statuses the escalation scanner watches, as stored in the table.
const OPEN_STATUSES: &str = "'new', 'in_progress', 'pending', 'reopened'";

/// Provides CRUD and scanner queries for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a new ticket in status `new`.
    pub async fn create(pool: &PgPool, draft: &TicketDraft) -> Result<TicketRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets \
                (title, description, priority, status, requester_id, assigned_to, \
                 sla_response_due, sla_resolution_due, sla_started_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(draft.priority.as_str())
            .bind(TicketStatus::New.as_str())
            .bind(draft.requester_id)
            .bind(draft.assigned_to)
            .bind(draft.deadlines.map(|d| d.response_due))
            .bind(draft.deadlines.map(|d| d.resolution_due))
            .bind(draft.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a ticket by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tickets matching the filter, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &TicketFilter,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if filter.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if filter.priority.is_some() {
            conditions.push(format!("priority = ${param_idx}"));
            param_idx += 1;
        }
        if filter.assigned_to.is_some() {
            conditions.push(format!("assigned_to = ${param_idx}"));
            param_idx += 1;
        }
        if filter.requester_id.is_some() {
            conditions.push(format!("requester_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM tickets {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, TicketRow>(&query);

        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(assignee) = filter.assigned_to {
            q = q.bind(assignee);
        }
        if let Some(requester) = filter.requester_id {
            q = q.bind(requester);
        }
        q = q.bind(filter.limit).bind(filter.offset);

        q.fetch_all(pool).await
    }

    /// Write every mutable column of `ticket` if its version still matches.
    ///
    /// Returns `None` when the row is missing or was modified since it was
    /// read.
    pub async fn update_versioned<'e, E>(
        executor: E,
        ticket: &Ticket,
    ) -> Result<Option<TicketRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE tickets SET \
                title = $2, description = $3, priority = $4, status = $5, \
                assigned_to = $6, resolution_summary = $7, resolution_category = $8, \
                root_cause = $9, sla_response_due = $10, sla_resolution_due = $11, \
                sla_started_at = $12, resolved_at = $13, pending_confirmation_since = $14, \
                updated_at = $15, version = version + 1 \
             WHERE id = $1 AND version = $16 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket.id)
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(ticket.priority.as_str())
            .bind(ticket.status.as_str())
            .bind(ticket.assigned_to)
            .bind(&ticket.resolution.resolution_summary)
            .bind(&ticket.resolution.resolution_category)
            .bind(&ticket.resolution.root_cause)
            .bind(ticket.sla_response_due)
            .bind(ticket.sla_resolution_due)
            .bind(ticket.sla_started_at)
            .bind(ticket.resolved_at)
            .bind(ticket.pending_confirmation_since)
            .bind(ticket.updated_at)
            .bind(ticket.version)
            .fetch_optional(executor)
            .await
    }

    /// Open tickets that carry a resolution deadline.
    pub async fn find_open_with_sla(pool: &PgPool) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets \
             WHERE status IN ({OPEN_STATUSES}) AND sla_resolution_due IS NOT NULL \
             ORDER BY sla_resolution_due ASC, id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query).fetch_all(pool).await
    }

    /// Resolved tickets awaiting confirmation since `cutoff` or earlier.
    pub async fn find_pending_confirmation_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets \
             WHERE status = $1 \
               AND pending_confirmation_since IS NOT NULL \
               AND pending_confirmation_since <= $2 \
             ORDER BY pending_confirmation_since ASC, id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(TicketStatus::Resolved.as_str())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Resolved tickets not awaiting confirmation, resolved before `cutoff`.
    ///
    /// This is a coarse calendar prefilter; the business-day window is
    /// applied by the caller.
    /// Resolved tickets without a confirmation request. `None` returns all
    /// of them.
    pub async fn find_resolved_before(
        pool: &PgPool,
        cutoff: Option<Timestamp>,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets \
             WHERE status = $1 \
               AND pending_confirmation_since IS NULL \
               AND resolved_at IS NOT NULL \
               AND ($2::timestamptz IS NULL OR resolved_at < $2) \
             ORDER BY resolved_at ASC, id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(TicketStatus::Resolved.as_str())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
