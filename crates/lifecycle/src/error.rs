use servicedesk_core::error::CoreError;
use servicedesk_core::types::DbId;

/// Errors raised by the periodic scanners.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Processing one ticket failed; the scan logs it and moves on.
    #[error("Processing ticket {ticket_id} failed: {source}")]
    Transient {
        ticket_id: DbId,
        #[source]
        source: CoreError,
    },

    /// The scan could not load its work set.
    #[error("Scan query failed: {0}")]
    Scan(#[source] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_error_names_the_ticket() {
        let err = JobError::Transient {
            ticket_id: 12,
            source: CoreError::Internal("connection reset".into()),
        };
        assert_eq!(
            err.to_string(),
            "Processing ticket 12 failed: Internal error: connection reset"
        );
    }
}
