//! Database module
//!
//! Durable identity records keyed by the chat platform's user id.

mod schema;

pub use schema::*;

use crate::i18n::Language;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Invalid panel identity for user {0}")]
    InvalidPanelIdentity(i64),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const USER_COLUMNS: &str = "external_id, display_name, handle, language, is_registered,
     panel_identity, created_at, updated_at";

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== User Operations ====================

    /// Create the record on first contact, otherwise refresh the display
    /// name and handle. Language and registration are never touched here.
    pub fn upsert_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
        handle: Option<&str>,
    ) -> DbResult<UserRecord> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (external_id, display_name, handle, language, is_registered, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
             ON CONFLICT(external_id) DO UPDATE SET
                display_name = excluded.display_name,
                handle = excluded.handle,
                updated_at = excluded.updated_at",
            params![external_id, display_name, handle, Language::default().code(), now],
        )?;

        Self::query_user(&conn, external_id)?.ok_or(DbError::UserNotFound(external_id))
    }

    /// Get a user by external id
    pub fn get_user(&self, external_id: i64) -> DbResult<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        Self::query_user(&conn, external_id)
    }

    /// Set the user's language. Returns false when no record exists.
    pub fn set_language(&self, external_id: i64, language: Language) -> DbResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let updated = conn.execute(
            "UPDATE users SET language = ?1, updated_at = ?2 WHERE external_id = ?3",
            params![language.code(), now.to_rfc3339(), external_id],
        )?;
        Ok(updated > 0)
    }

    /// Mark the user registered and link the panel identity in one statement.
    /// Returns false when no record exists.
    pub fn link_panel_identity(&self, external_id: i64, panel_identity: &str) -> DbResult<bool> {
        if panel_identity.trim().is_empty() {
            return Err(DbError::InvalidPanelIdentity(external_id));
        }
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let updated = conn.execute(
            "UPDATE users SET is_registered = 1, panel_identity = ?1, updated_at = ?2
             WHERE external_id = ?3",
            params![panel_identity, now.to_rfc3339(), external_id],
        )?;
        Ok(updated > 0)
    }

    /// Count stored users
    #[allow(dead_code)] // Used in tests
    pub fn count_users(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(DbError::from)
    }

    fn query_user(conn: &Connection, external_id: i64) -> DbResult<Option<UserRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"
        ))?;
        stmt.query_row(params![external_id], parse_user_row)
            .optional()
            .map_err(DbError::from)
    }
}

/// Parse a user row from the database
fn parse_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let language: String = row.get(3)?;
    Ok(UserRecord {
        external_id: row.get(0)?,
        display_name: row.get(1)?,
        handle: row.get(2)?,
        language: language.parse().unwrap_or_default(),
        is_registered: row.get(4)?,
        panel_identity: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
