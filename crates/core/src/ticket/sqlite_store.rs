//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, ToSql};

use super::{NewTicket, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore};
use crate::db;

const TICKET_COLUMNS: &str =
    "id, event_id, holder_id, code, status, price, created_at, updated_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = db::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn = db::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                holder_id TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                price REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_event ON tickets(event_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_holder ON tickets(holder_id, created_at DESC);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref event_id) = filter.event_id {
            conditions.push("event_id = ?");
            params.push(Box::new(event_id.clone()));
        }

        if let Some(ref holder_id) = filter.holder_id {
            conditions.push("holder_id = ?");
            params.push(Box::new(holder_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let status: String = row.get(4)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;

        Ok(Ticket {
            id: row.get(0)?,
            event_id: row.get(1)?,
            holder_id: row.get(2)?,
            code: row.get(3)?,
            status: db::parse_text(4, &status)?,
            price: row.get(5)?,
            created_at: db::parse_timestamp(6, &created_at)?,
            updated_at: db::parse_timestamp(7, &updated_at)?,
        })
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = db::lock(&self.conn);

        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE {} = ?", TICKET_COLUMNS, column),
            params![value],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        let conn = db::lock(&self.conn);

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = TicketStatus::Active;

        conn.execute(
            "INSERT INTO tickets (id, event_id, holder_id, code, status, price, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                ticket.event_id,
                ticket.holder_id,
                ticket.code,
                status.as_str(),
                ticket.price,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                TicketError::DuplicateCode(ticket.code.clone())
            } else {
                TicketError::Database(e.to_string())
            }
        })?;

        Ok(Ticket {
            id,
            event_id: ticket.event_id,
            holder_id: ticket.holder_id,
            code: ticket.code,
            status,
            price: ticket.price,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        self.find_one("id", id)
    }

    fn get_by_code(&self, code: &str) -> Result<Option<Ticket>, TicketError> {
        self.find_one("code", code)
    }

    fn delete(&self, id: &str) -> Result<(), TicketError> {
        let conn = db::lock(&self.conn);

        let deleted = conn
            .execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if deleted == 0 {
            return Err(TicketError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn update_status(
        &self,
        id: &str,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<bool, TicketError> {
        let conn = db::lock(&self.conn);

        let changed = conn
            .execute(
                "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![to.as_str(), Utc::now().to_rfc3339(), id, from.as_str()],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(changed == 1)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = db::lock(&self.conn);

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            TICKET_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = db::lock(&self.conn);

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }
}
