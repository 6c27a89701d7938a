//! Read connection pool for queries and statistics.
//!
//! Uses r2d2 with r2d2_sqlite for pooled read access.
//! SQLite WAL mode allows concurrent readers next to the writer thread.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

use super::schema::apply_reader_pragmas;
use super::{from_db_time, to_db_time};
use crate::model::{Reservation, ReservationFilter};

/// Column list shared by every reservation query.
pub(crate) const SELECT_RESERVATION: &str = "SELECT id, first_name, last_name, amount, phone_number, email, created_at, reserve_at, status, notes FROM reservations";

/// Error type for reader pool operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Read connection pool for reservation queries.
///
/// Provides pooled read-only connections for concurrent access.
#[derive(Clone)]
pub struct ReaderPool {
    pool: Pool<SqliteConnectionManager>,
}

impl ReaderPool {
    /// Create a new reader pool for the given database path.
    ///
    /// The database must already exist; the writer creates it.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    pub fn new<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, ReaderError> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(ReaderConnectionCustomizer))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, ReaderError> {
        Ok(self.pool.get()?)
    }

    /// Look up a single reservation.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Reservation>, ReaderError> {
        let conn = self.get()?;
        let reservation = conn
            .query_row(
                &format!("{SELECT_RESERVATION} WHERE id = ?1"),
                [id],
                row_to_reservation,
            )
            .optional()?;
        Ok(reservation)
    }

    /// List reservations matching `filter`, latest `reserve_at` first.
    pub fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReaderError> {
        let (clause, args) = filter_clause(filter);
        let sql = format!("{SELECT_RESERVATION} WHERE 1=1{clause} ORDER BY reserve_at DESC, id ASC");

        let conn = self.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), row_to_reservation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Build the `AND ...` predicates and bound values for a filter.
fn filter_clause(filter: &ReservationFilter) -> (String, Vec<Value>) {
    let mut clause = String::new();
    let mut args = Vec::new();

    let substrings = [
        ("id", &filter.id),
        ("first_name", &filter.first_name),
        ("last_name", &filter.last_name),
        ("email", &filter.email),
        ("phone_number", &filter.phone_number),
    ];
    for (column, needle) in substrings {
        if let Some(needle) = needle {
            clause.push_str(&format!(" AND {column} LIKE ? ESCAPE '\\'"));
            args.push(Value::Text(like_pattern(needle)));
        }
    }

    if let Some(status) = filter.status {
        clause.push_str(" AND status = ?");
        args.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(min_amount) = filter.min_amount {
        clause.push_str(" AND amount >= ?");
        args.push(Value::Integer(i64::from(min_amount)));
    }
    if let Some(from) = &filter.date_from {
        clause.push_str(" AND reserve_at >= ?");
        args.push(Value::Text(to_db_time(from)));
    }
    if let Some(to) = &filter.date_to {
        clause.push_str(" AND reserve_at <= ?");
        args.push(Value::Text(to_db_time(to)));
    }

    (clause, args)
}

/// Wrap `needle` for a substring LIKE match, escaping wildcards.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a row selected with [`SELECT_RESERVATION`].
pub(crate) fn row_to_reservation(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        amount: row.get(3)?,
        phone_number: row.get(4)?,
        email: row.get(5)?,
        created_at: time_column(row, 6)?,
        reserve_at: time_column(row, 7)?,
        status: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(idx)?;
    from_db_time(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Connection customizer that applies reader pragmas.
#[derive(Debug)]
struct ReaderConnectionCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error>
    for ReaderConnectionCustomizer
{
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        apply_reader_pragmas(conn)
    }
}
