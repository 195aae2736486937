// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::{Features, Paths, Reminders, Security};
use crate::consts::{DEFAULT_DUE_HOUR, DEFAULT_REMINDER_OFFSET_MINUTES, DEFAULT_REMINDER_POLL_SECS};
use crate::enums::KdfMethod;

pub const ENV_CONFIG: &str = "TV_CONFIG";
pub const ENV_DB: &str = "TV_DB";
pub const DEFAULT_CONFIG_FILE: &str = "task-vault.toml";
pub const DEFAULT_DB_FILE: &str = "task-vault.db";

pub fn default_paths() -> Paths {
    let database = dirs::data_local_dir()
        .map(|dir| dir.join("task-vault").join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    Paths { database }
}

pub fn default_security() -> Security {
    Security {
        kdf_method: KdfMethod::Argon2id,
    }
}

pub fn default_reminders() -> Reminders {
    Reminders {
        enabled: true,
        offsets_minutes: vec![DEFAULT_REMINDER_OFFSET_MINUTES],
        due_hour: DEFAULT_DUE_HOUR,
        quiet_hours_start: None,
        quiet_hours_end: None,
        poll_secs: DEFAULT_REMINDER_POLL_SECS,
    }
}

pub fn default_features() -> Features {
    Features {
        skip_kdf_slowdown: false,
    }
}
