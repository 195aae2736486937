// src/db/notifications.rs
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Row};

use super::Database;
use crate::enums::NotificationKind;
use crate::error::{CoreError, Result};
use crate::models::ScheduledNotification;

const NOTIFICATION_COLUMNS: &str = "id, kind, task_id, trigger_at, delivered, canceled";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledNotification> {
    let kind: String = row.get(1)?;
    let kind = NotificationKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            Box::new(CoreError::Validation(format!("unknown notification kind {kind:?}"))),
        )
    })?;
    Ok(ScheduledNotification {
        id: row.get(0)?,
        kind,
        task_id: row.get(2)?,
        trigger_at: row.get(3)?,
        delivered: row.get(4)?,
        canceled: row.get(5)?,
    })
}

impl Database {
    /// Insert (no id) or update (id set). Returns the row id.
    pub async fn save_notification(&self, n: &ScheduledNotification) -> Result<i64> {
        let conn = self.conn().await;
        match n.id {
            None => {
                conn.execute(
                    "INSERT INTO scheduled_notifications
                         (kind, task_id, trigger_at, delivered, canceled)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![n.kind.as_str(), n.task_id, n.trigger_at, n.delivered, n.canceled],
                )?;
                Ok(conn.last_insert_rowid())
            }
            Some(id) => {
                conn.execute(
                    "UPDATE scheduled_notifications
                     SET kind = ?1, task_id = ?2, trigger_at = ?3, delivered = ?4, canceled = ?5
                     WHERE id = ?6",
                    params![n.kind.as_str(), n.task_id, n.trigger_at, n.delivered, n.canceled, id],
                )?;
                Ok(id)
            }
        }
    }

    /// Undelivered, uncanceled notifications due at or before `before`, oldest first
    pub async fn load_pending_notifications(
        &self,
        before: NaiveDateTime,
    ) -> Result<Vec<ScheduledNotification>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM scheduled_notifications
             WHERE delivered = 0 AND canceled = 0 AND trigger_at <= ?1
             ORDER BY trigger_at, id"
        ))?;
        let rows = stmt
            .query_map([before], from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub async fn load_notifications_for_task(
        &self,
        task_id: i64,
    ) -> Result<Vec<ScheduledNotification>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM scheduled_notifications
             WHERE task_id = ?1 ORDER BY trigger_at, id"
        ))?;
        let rows = stmt
            .query_map([task_id], from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub async fn mark_notification_delivered(&self, id: i64) -> Result<()> {
        let conn = self.conn().await;
        conn.execute(
            "UPDATE scheduled_notifications SET delivered = 1 WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    /// Mark a task's unfired reminders canceled; they stay for history
    pub async fn cancel_notifications_for_task(&self, task_id: i64) -> Result<usize> {
        let conn = self.conn().await;
        let n = conn.execute(
            "UPDATE scheduled_notifications SET canceled = 1
             WHERE task_id = ?1 AND delivered = 0 AND canceled = 0",
            [task_id],
        )?;
        Ok(n)
    }

    pub async fn delete_unfired_notifications_for_task(&self, task_id: i64) -> Result<usize> {
        let conn = self.conn().await;
        let n = conn.execute(
            "DELETE FROM scheduled_notifications WHERE task_id = ?1 AND delivered = 0",
            [task_id],
        )?;
        Ok(n)
    }

    /// Shutdown sweep: cancel everything still pending
    pub async fn cancel_all_pending_notifications(&self) -> Result<usize> {
        let conn = self.conn().await;
        let n = conn.execute(
            "UPDATE scheduled_notifications SET canceled = 1 WHERE delivered = 0 AND canceled = 0",
            [],
        )?;
        Ok(n)
    }
}
