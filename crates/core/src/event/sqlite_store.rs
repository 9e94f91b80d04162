//! SQLite-backed event store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, ToSql};

use super::{CreateEventRequest, Event, EventError, EventStore, UpdateEventRequest};
use crate::db;

const EVENT_COLUMNS: &str = "id, title, description, date, location, price, total_tickets, available_tickets, organizer_id, created_at, updated_at";

/// SQLite-backed event store.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    pub fn new(path: &Path) -> Result<Self, EventError> {
        let conn = db::open(path).map_err(|e| EventError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, EventError> {
        let conn = db::open_in_memory().map_err(|e| EventError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), EventError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                location TEXT NOT NULL,
                price REAL NOT NULL,
                total_tickets INTEGER NOT NULL,
                available_tickets INTEGER NOT NULL,
                organizer_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (available_tickets >= 0 AND available_tickets <= total_tickets)
            );

            CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);
            CREATE INDEX IF NOT EXISTS idx_events_organizer ON events(organizer_id);
            "#,
        )
        .map_err(|e| EventError::Database(e.to_string()))
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
        let date: String = row.get(3)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        Ok(Event {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            date: db::parse_timestamp(3, &date)?,
            location: row.get(4)?,
            price: row.get(5)?,
            total_tickets: row.get(6)?,
            available_tickets: row.get(7)?,
            organizer_id: row.get(8)?,
            created_at: db::parse_timestamp(9, &created_at)?,
            updated_at: db::parse_timestamp(10, &updated_at)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Event>, EventError> {
        conn.query_row(
            &format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS),
            params![id],
            Self::row_to_event,
        )
        .optional()
        .map_err(|e| EventError::Database(e.to_string()))
    }

    /// Fetch an event only if `organizer_id` owns it.
    fn fetch_owned(conn: &Connection, id: &str, organizer_id: &str) -> Result<Event, EventError> {
        match Self::fetch(conn, id)? {
            Some(event) if event.organizer_id == organizer_id => Ok(event),
            _ => Err(EventError::NotFound(id.to_string())),
        }
    }
}

impl EventStore for SqliteEventStore {
    fn create(&self, organizer_id: &str, request: CreateEventRequest) -> Result<Event, EventError> {
        request.validate()?;
        let conn = db::lock(&self.conn);

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO events (id, title, description, date, location, price, total_tickets, available_tickets, organizer_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.title,
                request.description,
                request.date.to_rfc3339(),
                request.location,
                request.price,
                request.total_tickets,
                request.total_tickets,
                organizer_id,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| EventError::Database(e.to_string()))?;

        Ok(Event {
            id,
            title: request.title,
            description: request.description,
            date: request.date,
            location: request.location,
            price: request.price,
            total_tickets: request.total_tickets,
            available_tickets: request.total_tickets,
            organizer_id: organizer_id.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Event>, EventError> {
        let conn = db::lock(&self.conn);
        Self::fetch(&conn, id)
    }

    fn list(&self) -> Result<Vec<Event>, EventError> {
        let conn = db::lock(&self.conn);

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM events ORDER BY date ASC, created_at ASC",
                EVENT_COLUMNS
            ))
            .map_err(|e| EventError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_event)
            .map_err(|e| EventError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| EventError::Database(e.to_string()))
    }

    fn update(
        &self,
        id: &str,
        organizer_id: &str,
        request: UpdateEventRequest,
    ) -> Result<Event, EventError> {
        request.validate()?;
        let conn = db::lock(&self.conn);

        let mut assignments: Vec<&str> = vec!["updated_at = ?"];
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(Utc::now().to_rfc3339())];

        if let Some(ref title) = request.title {
            assignments.push("title = ?");
            values.push(Box::new(title.clone()));
        }
        if let Some(ref description) = request.description {
            assignments.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(date) = request.date {
            assignments.push("date = ?");
            values.push(Box::new(date.to_rfc3339()));
        }
        if let Some(ref location) = request.location {
            assignments.push("location = ?");
            values.push(Box::new(location.clone()));
        }
        if let Some(price) = request.price {
            assignments.push("price = ?");
            values.push(Box::new(price));
        }

        // The sold count is read and rewritten inside the same statement, so
        // a booking landing between our read and write can't be lost.
        let mut conditions = String::from("id = ? AND organizer_id = ?");
        if let Some(total) = request.total_tickets {
            assignments.push("available_tickets = ? - (total_tickets - available_tickets)");
            values.push(Box::new(total));
            assignments.push("total_tickets = ?");
            values.push(Box::new(total));
        }
        values.push(Box::new(id.to_string()));
        values.push(Box::new(organizer_id.to_string()));
        if let Some(total) = request.total_tickets {
            conditions.push_str(" AND ? >= (total_tickets - available_tickets)");
            values.push(Box::new(total));
        }

        let sql = format!(
            "UPDATE events SET {} WHERE {}",
            assignments.join(", "),
            conditions
        );
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let changed = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(|e| EventError::Database(e.to_string()))?;

        if changed == 0 {
            let current = Self::fetch_owned(&conn, id, organizer_id)?;
            return match request.total_tickets {
                Some(requested) if requested < current.sold() => {
                    Err(EventError::CapacityBelowSold {
                        event_id: id.to_string(),
                        sold: current.sold(),
                        requested,
                    })
                }
                _ => Err(EventError::Database(format!(
                    "update of event {} matched no rows",
                    id
                ))),
            };
        }

        Self::fetch(&conn, id)?.ok_or_else(|| EventError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str, organizer_id: &str) -> Result<Event, EventError> {
        let conn = db::lock(&self.conn);

        let event = Self::fetch_owned(&conn, id, organizer_id)?;

        conn.execute(
            "DELETE FROM events WHERE id = ? AND organizer_id = ?",
            params![id, organizer_id],
        )
        .map_err(|e| EventError::Database(e.to_string()))?;

        Ok(event)
    }

    fn decrement_available(&self, id: &str) -> Result<bool, EventError> {
        let conn = db::lock(&self.conn);

        let changed = conn
            .execute(
                "UPDATE events SET available_tickets = available_tickets - 1, updated_at = ? WHERE id = ? AND available_tickets > 0",
                params![Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| EventError::Database(e.to_string()))?;

        Ok(changed == 1)
    }

    fn release_ticket(&self, id: &str) -> Result<bool, EventError> {
        let conn = db::lock(&self.conn);

        let changed = conn
            .execute(
                "UPDATE events SET available_tickets = available_tickets + 1, updated_at = ? WHERE id = ? AND available_tickets < total_tickets",
                params![Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| EventError::Database(e.to_string()))?;

        Ok(changed == 1)
    }
}
