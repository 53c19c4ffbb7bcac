//! Shared `SQLite` connection setup.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};

/// Default time a writer waits for the database write lock before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Opens a database file with the settings every store relies on.
///
/// Foreign keys are enforced and contended writers wait at most
/// `busy_timeout` before the statement fails with `SQLITE_BUSY`.
pub(crate) fn open(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn, busy_timeout)?;
    Ok(conn)
}

/// Opens a private in-memory database.
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
    Ok(conn)
}

fn configure(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(())
}

/// Returns whether the error is a uniqueness or other constraint violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
