//! Shared query parameter types for API handlers.

use serde::Deserialize;
use servicedesk_core::error::CoreError;
use servicedesk_core::model::TicketFilter;
use servicedesk_core::priority::Priority;
use servicedesk_core::search::{clamp_limit, clamp_offset};
use servicedesk_core::ticket_status::TicketStatus;
use servicedesk_core::types::DbId;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Query parameters for `GET /tickets`.
///
/// `status` and `priority` are parsed here so a typo is a 400 rather than an
/// empty result.
#[derive(Debug, Default, Deserialize)]
pub struct TicketListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<DbId>,
    pub requester_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TicketListParams {
    pub fn into_filter(self) -> Result<TicketFilter, CoreError> {
        Ok(TicketFilter {
            status: self.status.as_deref().map(str::parse::<TicketStatus>).transpose()?,
            priority: self.priority.as_deref().map(str::parse::<Priority>).transpose()?,
            assigned_to: self.assigned_to,
            requester_id: self.requester_id,
            limit: clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: clamp_offset(self.offset),
        })
    }
}

/// `?status=` filter for the override review queue.
#[derive(Debug, Deserialize)]
pub struct OverrideListParams {
    pub status: Option<String>,
}
