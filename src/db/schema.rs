//! Database schema and types

use crate::i18n::Language;
use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    external_id INTEGER PRIMARY KEY,
    display_name TEXT,
    handle TEXT,
    language TEXT NOT NULL DEFAULT 'en',
    is_registered BOOLEAN NOT NULL DEFAULT 0,
    panel_identity TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    CHECK ((is_registered = 1) = (panel_identity IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_users_panel_identity ON users(panel_identity);
";

/// Durable per-user profile
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub external_id: i64,
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub language: Language,
    pub is_registered: bool,
    pub panel_identity: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh, unregistered record
    #[allow(dead_code)] // Used in tests
    pub fn new(external_id: i64, display_name: Option<&str>, handle: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            external_id,
            display_name: display_name.map(String::from),
            handle: handle.map(String::from),
            language: Language::default(),
            is_registered: false,
            panel_identity: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The linked panel identity, present only for registered users
    pub fn linked_identity(&self) -> Option<&str> {
        if self.is_registered {
            self.panel_identity.as_deref()
        } else {
            None
        }
    }
}
