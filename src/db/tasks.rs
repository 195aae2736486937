// src/db/tasks.rs
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use super::{Database, FieldCipher};
use crate::consts::LOCKED_PLACEHOLDER;
use crate::error::{CoreError, Result};
use crate::models::{Task, TaskFilter};
use crate::recurrence::RecurrenceRule;

const TASK_COLUMNS: &str = "id, title, notes, project_id, due_date, is_done, completed_at, \
     recurrence, sort_order, estimated_seconds, spent_seconds";

/// A task row before its sensitive columns are opened
struct StoredTask {
    id: i64,
    title: String,
    notes: String,
    project_id: Option<String>,
    due_date: Option<NaiveDate>,
    done: bool,
    completed_at: Option<NaiveDateTime>,
    recurrence: Option<String>,
    sort_order: i64,
    estimated_seconds: i64,
    spent_seconds: i64,
}

impl StoredTask {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredTask {
            id: row.get(0)?,
            title: row.get(1)?,
            notes: row.get(2)?,
            project_id: row.get(3)?,
            due_date: row.get(4)?,
            done: row.get(5)?,
            completed_at: row.get(6)?,
            recurrence: row.get(7)?,
            sort_order: row.get(8)?,
            estimated_seconds: row.get(9)?,
            spent_seconds: row.get(10)?,
        })
    }

    fn open(self, cipher: &impl FieldCipher) -> Result<Task> {
        let recurrence = match self.recurrence.as_deref() {
            Some(json) => Some(serde_json::from_str::<RecurrenceRule>(json)?),
            None => None,
        };
        Ok(Task {
            id: Some(self.id),
            title: cipher.open(&self.title)?,
            notes: cipher.open(&self.notes)?,
            project_id: self.project_id,
            due_date: self.due_date,
            done: self.done,
            completed_at: self.completed_at,
            recurrence,
            sort_order: self.sort_order,
            estimated_seconds: self.estimated_seconds,
            spent_seconds: self.spent_seconds,
        })
    }
}

fn where_clause(filter: &TaskFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(done) = filter.done {
        args.push(Value::Integer(i64::from(done)));
        clauses.push(format!("is_done = ?{}", args.len()));
    }
    if let Some(date) = filter.due_on {
        args.push(Value::Text(date.to_string()));
        clauses.push(format!("due_date = ?{}", args.len()));
    }
    if let Some(date) = filter.due_on_or_before {
        args.push(Value::Text(date.to_string()));
        clauses.push(format!("due_date <= ?{}", args.len()));
    }
    if let Some(date) = filter.due_after {
        args.push(Value::Text(date.to_string()));
        clauses.push(format!("due_date > ?{}", args.len()));
    }
    if filter.no_due_date {
        clauses.push("due_date IS NULL".into());
    }
    if !filter.project_ids.is_empty() {
        let mut slots = Vec::with_capacity(filter.project_ids.len());
        for id in &filter.project_ids {
            args.push(Value::Text(id.clone()));
            slots.push(format!("?{}", args.len()));
        }
        clauses.push(format!("project_id IN ({})", slots.join(", ")));
    }
    if filter.recurring_only {
        clauses.push("recurrence IS NOT NULL".into());
    }

    let mut sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    sql.push_str(" ORDER BY sort_order, id");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    (sql, args)
}

fn select_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<StoredTask>> {
    let (tail, args) = where_clause(filter);
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks{tail}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args), StoredTask::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn open_all(rows: Vec<StoredTask>, cipher: &impl FieldCipher) -> Result<Vec<Task>> {
    rows.into_iter().map(|r| r.open(cipher)).collect()
}

impl Database {
    /// Insert (no id) or update (id set). Returns the row id.
    pub async fn save_task(&self, cipher: &impl FieldCipher, task: &Task) -> Result<i64> {
        let recurrence = task
            .recurrence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn().await;
        let title = cipher.seal(&task.title)?;
        let notes = cipher.seal(&task.notes)?;

        match task.id {
            None => {
                conn.execute(
                    "INSERT INTO tasks (title, notes, project_id, due_date, is_done, completed_at,
                                        recurrence, sort_order, estimated_seconds, spent_seconds)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        title,
                        notes,
                        task.project_id,
                        task.due_date,
                        task.done,
                        task.completed_at,
                        recurrence,
                        task.sort_order,
                        task.estimated_seconds,
                        task.spent_seconds,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                debug!(task_id = id, "inserted task");
                Ok(id)
            }
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE tasks SET title = ?1, notes = ?2, project_id = ?3, due_date = ?4,
                            is_done = ?5, completed_at = ?6, recurrence = ?7, sort_order = ?8,
                            estimated_seconds = ?9, spent_seconds = ?10
                     WHERE id = ?11",
                    params![
                        title,
                        notes,
                        task.project_id,
                        task.due_date,
                        task.done,
                        task.completed_at,
                        recurrence,
                        task.sort_order,
                        task.estimated_seconds,
                        task.spent_seconds,
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Err(CoreError::Validation(format!("task {id} does not exist")));
                }
                debug!(task_id = id, "updated task");
                Ok(id)
            }
        }
    }

    pub async fn load_task(&self, cipher: &impl FieldCipher, id: i64) -> Result<Option<Task>> {
        let conn = self.conn().await;
        let stored = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                StoredTask::from_row,
            )
            .optional()?;
        stored.map(|s| s.open(cipher)).transpose()
    }

    pub async fn load_tasks(&self, cipher: &impl FieldCipher, filter: &TaskFilter) -> Result<Vec<Task>> {
        let conn = self.conn().await;
        let rows = select_tasks(&conn, filter)?;
        open_all(rows, cipher)
    }

    /// Due date of a task that is still open; `None` when the task is
    /// missing, done, or undated. Reads no encrypted column.
    pub async fn pending_due_date(&self, id: i64) -> Result<Option<NaiveDate>> {
        let conn = self.conn().await;
        let due: Option<Option<NaiveDate>> = conn
            .query_row(
                "SELECT due_date FROM tasks WHERE id = ?1 AND is_done = 0",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(due.flatten())
    }

    pub async fn delete_task(&self, id: i64) -> Result<bool> {
        let conn = self.conn().await;
        let n = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    /// Flip the done flag without touching (or needing to open) the text columns
    pub async fn set_task_done(
        &self,
        id: i64,
        done: bool,
        completed_at: Option<NaiveDateTime>,
    ) -> Result<bool> {
        let conn = self.conn().await;
        let n = conn.execute(
            "UPDATE tasks SET is_done = ?1, completed_at = ?2 WHERE id = ?3",
            params![done, completed_at, id],
        )?;
        Ok(n > 0)
    }

    pub async fn set_task_due_date(&self, id: i64, due: Option<NaiveDate>) -> Result<bool> {
        let conn = self.conn().await;
        let n = conn.execute(
            "UPDATE tasks SET due_date = ?1 WHERE id = ?2",
            params![due, id],
        )?;
        Ok(n > 0)
    }

    /// Sort position that puts a new task after every open one
    pub async fn next_sort_order(&self) -> Result<i64> {
        let conn = self.conn().await;
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(sort_order) FROM tasks WHERE is_done = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }

    pub async fn update_task_sort_orders(&self, orders: &[(i64, i64)]) -> Result<()> {
        let mut conn = self.conn().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare("UPDATE tasks SET sort_order = ?1 WHERE id = ?2")?;
            for (id, order) in orders {
                stmt.execute(params![order, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Tasks matching `filter` whose decrypted title equals `title`.
    ///
    /// Titles are encrypted, so this loads every row matching the plain
    /// predicates and compares after opening. While locked every encrypted
    /// title opens to the placeholder, so the placeholder matches nothing.
    pub async fn find_tasks_by_title(
        &self,
        cipher: &impl FieldCipher,
        filter: &TaskFilter,
        title: &str,
    ) -> Result<Vec<Task>> {
        if title == LOCKED_PLACEHOLDER {
            return Ok(Vec::new());
        }
        let tasks = self.load_tasks(cipher, filter).await?;
        Ok(tasks.into_iter().filter(|t| t.title == title).collect())
    }

    /// Delete every recurring task titled `title`. Returns how many went.
    ///
    /// Fetch-then-filter: all recurring rows are opened in memory, matching
    /// ids are collected, then deleted by id in one transaction.
    pub async fn delete_recurring_tasks_by_title(
        &self,
        cipher: &impl FieldCipher,
        title: &str,
    ) -> Result<usize> {
        if title == LOCKED_PLACEHOLDER {
            return Err(CoreError::LockedPlaceholderWrite);
        }
        let mut conn = self.conn().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidates: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, title FROM tasks WHERE recurrence IS NOT NULL")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut ids = Vec::new();
        for (id, stored) in candidates {
            if cipher.open(&stored)? == title {
                ids.push(id);
            }
        }

        for id in &ids {
            tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        }
        tx.commit()?;
        debug!(count = ids.len(), "deleted recurring series");
        Ok(ids.len())
    }
}
