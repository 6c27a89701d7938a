//! Schema and connection pragmas.

use rusqlite::Connection;

/// Apply pragmas for the read-write connection.
///
/// WAL lets the reader pool query while the writer thread commits.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = FULL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        "#,
    )
}

/// Apply pragmas for pooled read-only connections.
pub fn apply_reader_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA busy_timeout = 5000;
        PRAGMA query_only = ON;
        "#,
    )
}

/// Create the reservations table and its indexes if missing.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT NOT NULL,
            amount INTEGER NOT NULL,
            phone_number TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            reserve_at DATETIME NOT NULL,
            status TEXT NOT NULL,
            notes TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_reserve_at ON reservations(reserve_at);
        CREATE INDEX IF NOT EXISTS idx_status ON reservations(status);
        CREATE INDEX IF NOT EXISTS idx_last_name ON reservations(last_name);
        "#,
    )
}
