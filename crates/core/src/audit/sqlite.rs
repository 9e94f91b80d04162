use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{params, Connection, ToSql};

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};
use crate::db;

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Open (or create) the audit trail in a database file
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = db::open(path).map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite audit store (useful for testing)
    pub fn in_memory() -> Result<Self, AuditError> {
        let conn = db::open_in_memory().map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AuditError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                event_id TEXT,
                ticket_id TEXT,
                user_id TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
            CREATE INDEX IF NOT EXISTS idx_audit_events_event_id ON audit_events(event_id);
            CREATE INDEX IF NOT EXISTS idx_audit_events_ticket_id ON audit_events(ticket_id);
            CREATE INDEX IF NOT EXISTS idx_audit_events_user_id ON audit_events(user_id);
            "#,
        )
        .map_err(|e| AuditError::Database(e.to_string()))
    }

    fn build_where_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        let columns = [
            ("event_id = ?", &filter.event_id),
            ("ticket_id = ?", &filter.ticket_id),
            ("event_type = ?", &filter.event_type),
            ("user_id = ?", &filter.user_id),
        ];
        for (condition, value) in columns {
            if let Some(value) = value {
                conditions.push(condition);
                params.push(Box::new(value.clone()));
            }
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AuditRecord> {
        let timestamp: String = row.get(1)?;
        let data_json: String = row.get(6)?;
        let data: AuditEvent = serde_json::from_str(&data_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(AuditRecord {
            id: row.get(0)?,
            timestamp: db::parse_timestamp(1, &timestamp)?,
            event_type: row.get(2)?,
            event_id: row.get(3)?,
            ticket_id: row.get(4)?,
            user_id: row.get(5)?,
            data,
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        let conn = db::lock(&self.conn);
        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, event_id, ticket_id, user_id, data) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.event_id,
                record.ticket_id,
                record.user_id,
                data_json,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = db::lock(&self.conn);

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, event_id, ticket_id, user_id, data FROM audit_events {} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut all_params = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_record)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuditError::Database(e.to_string()))
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let conn = db::lock(&self.conn);

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", where_clause);
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn create_test_store() -> SqliteAuditStore {
        SqliteAuditStore::in_memory().unwrap()
    }

    fn service_started() -> AuditRecord {
        AuditRecord::from_event(
            Utc::now(),
            AuditEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            },
        )
    }

    fn ticket_booked(ticket_id: &str, event_id: &str, holder_id: &str) -> AuditRecord {
        AuditRecord::from_event(
            Utc::now(),
            AuditEvent::TicketBooked {
                ticket_id: ticket_id.to_string(),
                event_id: event_id.to_string(),
                holder_id: holder_id.to_string(),
                price: 30.0,
            },
        )
    }

    #[test]
    fn test_insert_and_query() {
        let store = create_test_store();
        let record = ticket_booked("t-1", "e-1", "u-1");

        let id = store.insert(&record).unwrap();
        assert!(id > 0);

        let results = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].event_type, "ticket_booked");
        assert_eq!(results[0].data, record.data);
    }

    #[test]
    fn test_query_filters() {
        let store = create_test_store();
        store.insert(&service_started()).unwrap();
        store.insert(&ticket_booked("t-1", "e-1", "u-1")).unwrap();
        store.insert(&ticket_booked("t-2", "e-1", "u-2")).unwrap();
        store.insert(&ticket_booked("t-3", "e-2", "u-1")).unwrap();

        let by_type = AuditFilter::new().with_event_type("ticket_booked");
        assert_eq!(store.query(&by_type).unwrap().len(), 3);

        let by_event = AuditFilter::new().with_event_id("e-1");
        assert_eq!(store.query(&by_event).unwrap().len(), 2);

        let by_ticket = AuditFilter::new().with_ticket_id("t-3");
        let results = store.query(&by_ticket).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_id.as_deref(), Some("e-2"));

        let by_user = AuditFilter::new().with_user_id("u-1").with_event_id("e-2");
        assert_eq!(store.count(&by_user).unwrap(), 1);
    }

    #[test]
    fn test_query_with_time_range() {
        let store = create_test_store();

        let now = Utc::now();
        let mut old_record = service_started();
        old_record.timestamp = now - Duration::hours(2);
        store.insert(&old_record).unwrap();

        let mut new_record = service_started();
        new_record.timestamp = now;
        store.insert(&new_record).unwrap();

        let filter = AuditFilter::new().with_time_range(Some(now - Duration::hours(1)), None);
        assert_eq!(store.query(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_query_newest_first_with_pagination() {
        let store = create_test_store();
        for i in 0..5 {
            store
                .insert(&ticket_booked(&format!("t-{}", i), "e-1", "u-1"))
                .unwrap();
        }

        let first_page = store
            .query(&AuditFilter::new().with_limit(2).with_offset(0))
            .unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].ticket_id.as_deref(), Some("t-4"));

        let last_page = store
            .query(&AuditFilter::new().with_limit(2).with_offset(4))
            .unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].ticket_id.as_deref(), Some("t-0"));

        assert_eq!(store.count(&AuditFilter::new()).unwrap(), 5);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("audit.db");

        let store = SqliteAuditStore::new(&db_path).unwrap();
        store.insert(&service_started()).unwrap();

        assert!(db_path.exists());
        assert_eq!(store.query(&AuditFilter::new()).unwrap().len(), 1);
    }
}
