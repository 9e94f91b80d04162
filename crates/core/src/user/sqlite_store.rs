//! SQLite-backed user store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewUser, User, UserError, UserStore};
use crate::db;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// SQLite-backed user store.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(path: &Path) -> Result<Self, UserError> {
        let conn = db::open(path).map_err(|e| UserError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, UserError> {
        let conn = db::open_in_memory().map_err(|e| UserError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), UserError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| UserError::Database(e.to_string()))
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let role: String = row.get(4)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: db::parse_text(4, &role)?,
            created_at: db::parse_timestamp(5, &created_at)?,
            updated_at: db::parse_timestamp(6, &updated_at)?,
        })
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, UserError> {
        let conn = db::lock(&self.conn);
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);

        conn.query_row(&sql, params![value], Self::row_to_user)
            .optional()
            .map_err(|e| UserError::Database(e.to_string()))
    }
}

impl UserStore for SqliteUserStore {
    fn create(&self, user: NewUser) -> Result<User, UserError> {
        let conn = db::lock(&self.conn);

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                UserError::EmailTaken(user.email.clone())
            } else {
                UserError::Database(e.to_string())
            }
        })?;

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<User>, UserError> {
        self.find_one("id", id)
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        self.find_one("email", email)
    }
}
