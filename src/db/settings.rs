// src/db/settings.rs
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::Database;
use crate::auth::{EnabledSettings, EncryptionSettings};
use crate::consts::{
    SETTING_ENCRYPTION_ENABLED, SETTING_ENCRYPTION_SALT, SETTING_KDF_METHOD, SETTING_KEY_HASH,
};
use crate::enums::KdfMethod;
use crate::error::Result;

impl Database {
    pub async fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        get_setting(&*self.conn().await, key)
    }

    pub async fn set_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        set_setting(&*self.conn().await, key, value)
    }

    pub async fn load_encryption_settings(&self) -> Result<EncryptionSettings> {
        load_encryption_settings(&*self.conn().await)
    }
}

pub(super) fn get_setting<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub(super) fn set_setting<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, json],
    )?;
    Ok(())
}

fn delete_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
    Ok(())
}

pub(super) fn load_encryption_settings(conn: &Connection) -> Result<EncryptionSettings> {
    let enabled: bool = get_setting(conn, SETTING_ENCRYPTION_ENABLED)?.unwrap_or(false);
    let kdf_method: KdfMethod = get_setting(conn, SETTING_KDF_METHOD)?.unwrap_or_default();

    if !enabled {
        return Ok(EncryptionSettings::Disabled { kdf_method });
    }

    let salt: Option<String> = get_setting(conn, SETTING_ENCRYPTION_SALT)?;
    let hash: Option<String> = get_setting(conn, SETTING_KEY_HASH)?;
    let (Some(salt), Some(hash)) = (salt, hash) else {
        warn!("encryption flagged enabled but salt or key hash is missing; treating as disabled");
        return Ok(EncryptionSettings::Disabled { kdf_method });
    };

    match EnabledSettings::from_b64(&salt, &hash, kdf_method) {
        Ok(s) => Ok(EncryptionSettings::Enabled(s)),
        Err(e) => {
            warn!(error = %e, "unusable encryption settings; treating as disabled");
            Ok(EncryptionSettings::Disabled { kdf_method })
        }
    }
}

pub(super) fn write_encryption_settings(
    conn: &Connection,
    settings: &EncryptionSettings,
) -> Result<()> {
    match settings {
        EncryptionSettings::Enabled(s) => {
            set_setting(conn, SETTING_ENCRYPTION_ENABLED, &true)?;
            set_setting(conn, SETTING_ENCRYPTION_SALT, &s.salt_b64())?;
            set_setting(conn, SETTING_KEY_HASH, &s.key_hash_b64())?;
            set_setting(conn, SETTING_KDF_METHOD, &s.kdf_method)?;
        }
        EncryptionSettings::Disabled { kdf_method } => {
            set_setting(conn, SETTING_ENCRYPTION_ENABLED, &false)?;
            delete_setting(conn, SETTING_ENCRYPTION_SALT)?;
            delete_setting(conn, SETTING_KEY_HASH)?;
            set_setting(conn, SETTING_KDF_METHOD, kdf_method)?;
        }
    }
    Ok(())
}
