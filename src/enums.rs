// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the closed sets of user-visible choices:
//! key derivation methods, auth states, recurrence frequencies, etc.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Password-based key derivation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KdfMethod {
    #[default]
    #[serde(rename = "argon2", alias = "argon2id")]
    Argon2id,
    #[serde(rename = "pbkdf2")]
    Pbkdf2,
}

impl KdfMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            KdfMethod::Argon2id => "argon2",
            KdfMethod::Pbkdf2 => "pbkdf2",
        }
    }
}

impl fmt::Display for KdfMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock state of the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No master password has been set up
    NotConfigured,
    /// Master password set, key not in memory
    Locked,
    /// Key derived and held in memory
    Unlocked,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthState::NotConfigured => "not configured",
            AuthState::Locked => "locked",
            AuthState::Unlocked => "unlocked",
        };
        f.write_str(s)
    }
}

/// Unit a recurrence interval is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Days,
    #[default]
    Weeks,
    Months,
}

/// Kind of a persisted scheduled notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum NotificationKind {
    DueReminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::DueReminder => "due_reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "due_reminder" => Some(NotificationKind::DueReminder),
            _ => None,
        }
    }
}
