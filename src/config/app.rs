// src/config/app.rs
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::defaults::*;
use crate::crypto::KdfParams;
use crate::enums::KdfMethod;
use crate::error::{CoreError, Result};
use crate::reminders::ReminderPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub security: Security,
    pub reminders: Reminders,
    pub features: Features,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub database: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    /// KDF used when a new master password is set up
    pub kdf_method: KdfMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reminders {
    pub enabled: bool,
    pub offsets_minutes: Vec<u32>,
    pub due_hour: u32,
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    pub poll_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Use the cheap KDF profile. Development and tests only.
    pub skip_kdf_slowdown: bool,
}

impl Default for Paths {
    fn default() -> Self {
        default_paths()
    }
}

impl Default for Security {
    fn default() -> Self {
        default_security()
    }
}

impl Default for Reminders {
    fn default() -> Self {
        default_reminders()
    }
}

impl Default for Features {
    fn default() -> Self {
        default_features()
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let conf: Config =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.reminders.due_hour > 23 {
            return Err(CoreError::Config(format!(
                "reminders.due_hour must be 0..=23, got {}",
                self.reminders.due_hour
            )));
        }
        if self.reminders.poll_secs == 0 {
            return Err(CoreError::Config("reminders.poll_secs must be > 0".into()));
        }
        if self.reminders.quiet_hours_start.is_some() != self.reminders.quiet_hours_end.is_some() {
            return Err(CoreError::Config(
                "quiet_hours_start and quiet_hours_end must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn kdf_params(&self) -> KdfParams {
        if self.features.skip_kdf_slowdown {
            KdfParams::fast()
        } else {
            KdfParams::PRODUCTION
        }
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        let r = &self.reminders;
        let quiet_hours = match (r.quiet_hours_start, r.quiet_hours_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };
        ReminderPolicy {
            enabled: r.enabled,
            offsets_minutes: r.offsets_minutes.clone(),
            due_time: NaiveTime::from_hms_opt(r.due_hour, 0, 0).unwrap_or(NaiveTime::MIN),
            quiet_hours,
            poll_interval: Duration::from_secs(r.poll_secs),
        }
    }

    /// Database path with the `TV_DB` override applied
    pub fn database_path(&self) -> PathBuf {
        std::env::var_os(ENV_DB)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.paths.database.clone())
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide config, read once from `TV_CONFIG` (default `task-vault.toml`).
///
/// A missing file falls back to built-in defaults; an unreadable or invalid
/// one also falls back, with a warning, so a typo never bricks startup.
pub fn load() -> &'static Config {
    CONFIG.get_or_init(|| {
        let config_path =
            std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            info!(path = %config_path, "config file not found, using built-in defaults");
            return Config::default();
        }

        match Config::from_path(&config_path) {
            Ok(conf) => conf,
            Err(e) => {
                warn!(path = %config_path, error = %e, "invalid config, using built-in defaults");
                Config::default()
            }
        }
    })
}
