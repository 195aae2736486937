// src/db/reseal.rs
//! All-or-nothing rewrite of every encrypted column
//!
//! Used by setup, change-password and disable. Everything between taking
//! the connection and releasing it is synchronous, so once started the
//! rewrite cannot be interrupted by dropping the caller's future.

use rusqlite::types::Value;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use super::settings::write_encryption_settings;
use super::Database;
use crate::auth::EncryptionSettings;
use crate::error::{CoreError, Result};

/// (table, key column, sensitive column)
pub const ENCRYPTED_COLUMNS: &[(&str, &str, &str)] = &[
    ("tasks", "id", "title"),
    ("tasks", "id", "notes"),
    ("projects", "id", "name"),
    ("daily_notes", "date", "content"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResealReport {
    pub values_seen: usize,
    pub values_rewritten: usize,
}

impl Database {
    /// Rewrite every non-empty sensitive value through `transform` and
    /// persist `settings`, in one IMMEDIATE transaction.
    ///
    /// Any error from `transform` or SQLite rolls everything back and comes
    /// out as `CoreError::Reencryption`. `on_commit` runs after the commit
    /// while the connection is still held, so no reader sees new rows paired
    /// with the old in-memory key.
    pub async fn reseal_all<F, C>(
        &self,
        transform: F,
        settings: &EncryptionSettings,
        on_commit: C,
    ) -> Result<ResealReport>
    where
        F: FnMut(&str) -> Result<String>,
        C: FnOnce(),
    {
        let mut conn = self.conn().await;
        match reseal_locked(&mut conn, transform, settings) {
            Ok(report) => {
                on_commit();
                info!(
                    seen = report.values_seen,
                    rewritten = report.values_rewritten,
                    enabled = settings.is_enabled(),
                    "re-encryption committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "re-encryption rolled back");
                Err(CoreError::Reencryption(Box::new(e)))
            }
        }
    }
}

fn reseal_locked<F>(
    conn: &mut Connection,
    mut transform: F,
    settings: &EncryptionSettings,
) -> Result<ResealReport>
where
    F: FnMut(&str) -> Result<String>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = ResealReport::default();

    for &(table, key, column) in ENCRYPTED_COLUMNS {
        let rows: Vec<(Value, String)> = {
            let mut stmt = tx.prepare(&format!("SELECT {key}, {column} FROM {table}"))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut update = tx.prepare(&format!("UPDATE {table} SET {column} = ?1 WHERE {key} = ?2"))?;
        for (id, stored) in rows {
            if stored.is_empty() {
                continue;
            }
            report.values_seen += 1;
            let rewritten = transform(&stored)?;
            if rewritten != stored {
                update.execute(params![rewritten, id])?;
                report.values_rewritten += 1;
            }
        }
        debug!(table, column, "column resealed");
    }

    write_encryption_settings(&tx, settings)?;
    tx.commit()?;
    Ok(report)
}
