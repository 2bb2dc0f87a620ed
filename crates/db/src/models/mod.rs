//! Row structs for the ticket engine tables.
//!
//! Each submodule holds a `FromRow` struct mirroring one table. Enum-like
//! columns are stored as `TEXT` and decoded into the domain types from
//! `servicedesk-core` through `TryFrom`.

pub mod escalation;
pub mod priority_change;
pub mod priority_override;
pub mod sla_rule;
pub mod status_history;
pub mod ticket;

use std::str::FromStr;

use servicedesk_core::error::CoreError;
use servicedesk_core::store::StoreError;

/// Decode a `TEXT` column into a domain enum.
///
/// A value that fails to parse means the row violates the table's CHECK
/// constraint, which is reported as a backend error.
pub(crate) fn parse_column<T>(column: &'static str, value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = CoreError>,
{
    value
        .parse()
        .map_err(|e: CoreError| StoreError::Backend(format!("Invalid {column} in database: {e}")))
}
