// src/db/conn.rs
use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::consts::DB_BUSY_TIMEOUT_MS;
use crate::error::Result;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS projects (
        id    TEXT PRIMARY KEY,
        name  TEXT NOT NULL,
        icon  TEXT NOT NULL,
        color TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        title             TEXT NOT NULL,
        notes             TEXT NOT NULL DEFAULT '',
        project_id        TEXT REFERENCES projects(id) ON DELETE SET NULL,
        due_date          TEXT,
        is_done           INTEGER NOT NULL DEFAULT 0,
        completed_at      TEXT,
        recurrence        TEXT,
        sort_order        INTEGER NOT NULL DEFAULT 0,
        estimated_seconds INTEGER NOT NULL DEFAULT 900,
        spent_seconds     INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS daily_notes (
        date       TEXT PRIMARY KEY,
        content    TEXT NOT NULL DEFAULT '',
        updated_at TEXT
    );

    CREATE TABLE IF NOT EXISTS scheduled_notifications (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        kind       TEXT NOT NULL,
        task_id    INTEGER REFERENCES tasks(id) ON DELETE CASCADE,
        trigger_at TEXT NOT NULL,
        delivered  INTEGER NOT NULL DEFAULT 0,
        canceled   INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_done ON tasks(is_done);
    CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_date);
    CREATE INDEX IF NOT EXISTS idx_notifications_trigger
        ON scheduled_notifications(trigger_at, delivered);
"#;

/// The task store
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!(path = %path.display(), journal_mode = %mode, "opened task database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(DB_BUSY_TIMEOUT_MS))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        debug!("schema ready");
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) async fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Run raw SQL against the store. Test and maintenance hook; it bypasses
    /// field encryption entirely.
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn().await.execute_batch(sql)?;
        Ok(())
    }

    /// Read one raw column value, exactly as stored
    pub async fn raw_value(&self, table: &str, column: &str, rowid: i64) -> Result<Option<String>> {
        let conn = self.conn().await;
        let sql = format!("SELECT {column} FROM {table} WHERE rowid = ?1");
        match conn.query_row(&sql, [rowid], |row| row.get(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
