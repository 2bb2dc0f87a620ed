//! PostgreSQL implementation of [`TicketStore`].
//!
//! Multi-row writes (a ticket plus its audit row, an approved override plus
//! the priority change it causes) run in one transaction.

use async_trait::async_trait;
use chrono::{Days, NaiveTime};
use servicedesk_core::business_days::{calendar_cutoff, has_elapsed_business_days};
use servicedesk_core::model::{
    Escalation, NewEscalation, NewOverrideRequest, NewPriorityChange, NewStatusHistory,
    PriorityChange, PriorityOverrideRequest, StatusHistoryEntry, Ticket, TicketDraft,
    TicketFilter,
};
use servicedesk_core::priority::Priority;
use servicedesk_core::priority_override::OverrideStatus;
use servicedesk_core::sla::SlaRule;
use servicedesk_core::store::{StoreError, TicketStore};
use servicedesk_core::types::{DbId, Timestamp};

use crate::repositories::{
    EscalationRepo, PriorityChangeRepo, PriorityOverrideRepo, SlaRuleRepo, StatusHistoryRepo,
    TicketRepo,
};
use crate::DbPool;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error onto the storage error taxonomy.
///
/// Violations of `uq_` constraints become [`StoreError::Conflict`]; anything
/// else is a backend failure.
pub fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return StoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

/// Lower bound for the business-day query, or `None` when every resolved
/// ticket has to be checked.
///
/// N business days need at least N calendar dates after the resolution
/// date, so anything resolved on or after `now.date - (N - 1)` cannot
/// qualify yet. A window of zero has no bound.
fn resolved_prefilter(now: Timestamp, days: i64) -> Option<Timestamp> {
    if days <= 0 {
        return None;
    }
    let back = u64::try_from(days - 1).ok()?;
    let date = now.date_naive().checked_sub_days(Days::new(back))?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// [`TicketStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: DbPool,
}

impl PgTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn active_sla_rule(&self, priority: Priority) -> Result<Option<SlaRule>, StoreError> {
        SlaRuleRepo::find_active(&self.pool, priority)
            .await
            .map_err(map_sqlx)?
            .map(SlaRule::try_from)
            .transpose()
    }

    async fn list_sla_rules(&self) -> Result<Vec<SlaRule>, StoreError> {
        decode_all(SlaRuleRepo::list(&self.pool).await.map_err(map_sqlx)?)
    }

    async fn upsert_sla_rule(&self, rule: &SlaRule) -> Result<SlaRule, StoreError> {
        SlaRuleRepo::upsert(&self.pool, rule)
            .await
            .map_err(map_sqlx)?
            .try_into()
    }

    async fn insert_ticket(&self, draft: &TicketDraft) -> Result<Ticket, StoreError> {
        TicketRepo::create(&self.pool, draft)
            .await
            .map_err(map_sqlx)?
            .try_into()
    }

    async fn read_ticket(&self, id: DbId) -> Result<Option<Ticket>, StoreError> {
        TicketRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx)?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        decode_all(
            TicketRepo::list_filtered(&self.pool, filter)
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        TicketRepo::update_versioned(&self.pool, ticket)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::VersionConflict {
                ticket_id: ticket.id,
            })?
            .try_into()
    }

    async fn commit_transition(
        &self,
        ticket: &Ticket,
        entry: &NewStatusHistory,
    ) -> Result<(Ticket, StatusHistoryEntry), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = TicketRepo::update_versioned(&mut *tx, ticket)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::VersionConflict {
                ticket_id: ticket.id,
            })?;
        let history = StatusHistoryRepo::create(&mut *tx, entry)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok((row.try_into()?, history.try_into()?))
    }

    async fn commit_priority_change(
        &self,
        ticket: &Ticket,
        change: &NewPriorityChange,
        request: Option<&PriorityOverrideRequest>,
    ) -> Result<Ticket, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        if let Some(request) = request {
            PriorityOverrideRepo::record_review(&mut *tx, request)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| {
                    StoreError::Conflict(format!(
                        "Override request {} is no longer pending",
                        request.id
                    ))
                })?;
        }

        let row = TicketRepo::update_versioned(&mut *tx, ticket)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::VersionConflict {
                ticket_id: ticket.id,
            })?;
        PriorityChangeRepo::create(&mut *tx, change)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        row.try_into()
    }

    async fn status_history(&self, ticket_id: DbId) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        decode_all(
            StatusHistoryRepo::list_for_ticket(&self.pool, ticket_id)
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn priority_changes(&self, ticket_id: DbId) -> Result<Vec<PriorityChange>, StoreError> {
        decode_all(
            PriorityChangeRepo::list_for_ticket(&self.pool, ticket_id)
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn find_open_tickets_with_sla(&self) -> Result<Vec<Ticket>, StoreError> {
        decode_all(
            TicketRepo::find_open_with_sla(&self.pool)
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn find_pending_confirmation_older_than(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError> {
        decode_all(
            TicketRepo::find_pending_confirmation_before(&self.pool, calendar_cutoff(now, days))
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn find_resolved_older_than_business_days(
        &self,
        days: i64,
        now: Timestamp,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = TicketRepo::find_resolved_before(&self.pool, resolved_prefilter(now, days))
            .await
            .map_err(map_sqlx)?;
        let tickets: Vec<Ticket> = decode_all(rows)?;
        Ok(tickets
            .into_iter()
            .filter(|t| {
                t.resolved_at
                    .is_some_and(|resolved| has_elapsed_business_days(resolved, now, days))
            })
            .collect())
    }

    async fn append_escalation(&self, escalation: &NewEscalation) -> Result<Escalation, StoreError> {
        EscalationRepo::create(&self.pool, escalation)
            .await
            .map_err(map_sqlx)?
            .try_into()
    }

    async fn has_auto_escalation_since(
        &self,
        ticket_id: DbId,
        since: Timestamp,
    ) -> Result<bool, StoreError> {
        EscalationRepo::exists_auto_since(&self.pool, ticket_id, since)
            .await
            .map_err(map_sqlx)
    }

    async fn escalations_for_ticket(&self, ticket_id: DbId) -> Result<Vec<Escalation>, StoreError> {
        decode_all(
            EscalationRepo::list_for_ticket(&self.pool, ticket_id)
                .await
                .map_err(map_sqlx)?,
        )
    }

    async fn insert_override_request(
        &self,
        request: &NewOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError> {
        PriorityOverrideRepo::create(&self.pool, request)
            .await
            .map_err(map_sqlx)?
            .try_into()
    }

    async fn update_override_request(
        &self,
        request: &PriorityOverrideRequest,
    ) -> Result<PriorityOverrideRequest, StoreError> {
        PriorityOverrideRepo::record_review(&self.pool, request)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| {
                StoreError::Conflict(format!(
                    "Override request {} is no longer pending",
                    request.id
                ))
            })?
            .try_into()
    }

    async fn find_override_request(
        &self,
        id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError> {
        PriorityOverrideRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx)?
            .map(PriorityOverrideRequest::try_from)
            .transpose()
    }

    async fn find_pending_override(
        &self,
        ticket_id: DbId,
    ) -> Result<Option<PriorityOverrideRequest>, StoreError> {
        PriorityOverrideRepo::find_pending_for_ticket(&self.pool, ticket_id)
            .await
            .map_err(map_sqlx)?
            .map(PriorityOverrideRequest::try_from)
            .transpose()
    }

    async fn list_override_requests(
        &self,
        ticket_id: Option<DbId>,
        status: Option<OverrideStatus>,
    ) -> Result<Vec<PriorityOverrideRequest>, StoreError> {
        decode_all(
            PriorityOverrideRepo::list_filtered(&self.pool, ticket_id, status)
                .await
                .map_err(map_sqlx)?,
        )
    }
}
