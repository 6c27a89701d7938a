//! SQLite storage layer for Tablecast.
//!
//! Provides:
//! - Schema initialization and connection pragmas
//! - Dedicated writer thread that serializes every mutation
//! - Read connection pool for queries and statistics
//! - [`ReservationStore`], the validating facade over both

pub mod reader;
pub mod schema;
pub mod store;
pub mod writer;

pub use store::ReservationStore;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::model::ReservationStatus;

/// Render a timestamp the way it is stored.
///
/// Fixed-width UTC with microseconds, so text order equals time order and
/// range predicates can compare columns directly.
pub fn to_db_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn from_db_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

impl ToSql for ReservationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReservationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}
