// src/db/notes.rs
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, OptionalExtension};

use super::{Database, FieldCipher};
use crate::error::Result;
use crate::models::DailyNote;

impl Database {
    pub async fn save_daily_note(
        &self,
        cipher: &impl FieldCipher,
        date: NaiveDate,
        content: &str,
    ) -> Result<()> {
        let conn = self.conn().await;
        let sealed = cipher.seal(content)?;
        let now = Local::now().naive_local();
        conn.execute(
            "INSERT INTO daily_notes (date, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET
                 content = excluded.content, updated_at = excluded.updated_at",
            params![date, sealed, now],
        )?;
        Ok(())
    }

    pub async fn load_daily_note(
        &self,
        cipher: &impl FieldCipher,
        date: NaiveDate,
    ) -> Result<Option<DailyNote>> {
        let conn = self.conn().await;
        let row: Option<(String, Option<NaiveDateTime>)> = conn
            .query_row(
                "SELECT content, updated_at FROM daily_notes WHERE date = ?1",
                [date],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((content, updated_at)) => Ok(Some(DailyNote {
                date,
                content: cipher.open(&content)?,
                updated_at,
            })),
            None => Ok(None),
        }
    }
}
