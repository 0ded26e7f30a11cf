//! SQLite-backed persistent store.
//!
//! One `Store` owns one connection. Mutating service operations take
//! `&mut Store` so they can open a [`rusqlite::Transaction`], which rolls
//! back automatically unless committed — every reorder's position writes
//! land atomically or not at all.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction};

use crate::error::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS boards (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    owner_id    TEXT NOT NULL REFERENCES users(id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lists (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    position   INTEGER NOT NULL,
    board_id   TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    position    INTEGER NOT NULL,
    list_id     TEXT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
    created_by  TEXT NOT NULL REFERENCES users(id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS task_assignments (
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id),
    PRIMARY KEY (task_id, user_id)
);

CREATE TABLE IF NOT EXISTS activities (
    id          TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    description TEXT NOT NULL,
    user_id     TEXT NOT NULL REFERENCES users(id),
    board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    task_id     TEXT,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lists_board ON lists(board_id, position);
CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(list_id, position);
CREATE INDEX IF NOT EXISTS idx_activities_board ON activities(board_id, created_at);
";

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the database at `path`, applying the schema.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction; commit-or-rollback is guaranteed on every exit
    /// path (drop without commit rolls back).
    pub(crate) fn tx(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

// ---------------------------------------------------------------------------
// Timestamp mapping (RFC 3339 text columns)
// ---------------------------------------------------------------------------

pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn ts_from_sql(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_schema() {
        let store = Store::open_in_memory().unwrap();
        let n: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn open_on_disk_is_reopenable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("taskboard.db");
        drop(Store::open(&path).unwrap());
        // Second open must tolerate the existing schema.
        Store::open(&path).unwrap();
    }

    #[test]
    fn timestamps_round_trip() {
        let now = Utc::now();
        let back = ts_from_sql(&ts_to_sql(now)).unwrap();
        assert_eq!(now, back);
    }
}
