//! Connection helpers shared by the SQLite-backed stores.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};

/// How long a writer waits for a competing connection to release the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a database file, switching it to WAL so readers don't block the writer.
pub(crate) fn open(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(conn)
}

pub(crate) fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Lock a connection, recovering it if a previous holder panicked.
///
/// Every statement we run is atomic on its own, so a poisoned guard never
/// leaves a half-applied write behind.
pub(crate) fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Parse a text column into one of our closed enums.
pub(crate) fn parse_text<T>(column: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|msg| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Text,
            Box::<dyn StdError + Send + Sync>::from(msg),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_parse_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(0, &now.to_rfc3339()).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(3, "yesterday").is_err());
    }

    #[test]
    fn test_parse_text_enum() {
        let role: Role = parse_text(0, "organizer").unwrap();
        assert_eq!(role, Role::Organizer);
        assert!(parse_text::<Role>(0, "root").is_err());
    }

    #[test]
    fn test_unique_violation_detected() {
        let conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (code TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir.path().join("wal.db")).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
