// src/lib.rs
//! task-vault — encrypted storage core for a personal task manager
//!
//! Features:
//! - AES-256-GCM field encryption under an Argon2id / PBKDF2 derived key
//! - NotConfigured / Locked / Unlocked session with atomic re-keying
//! - SQLite task, project and daily-note store with per-column encryption
//! - Recurrence engine and due-date reminder scheduler
//! - Zeroizing secrecy wrappers for key and password material

pub mod aliases;
pub mod auth;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod db;
pub mod enums;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod reminders;
pub mod workflow;

// Re-export everything users need at the crate root
pub use aliases::{FieldKey32, MasterPassword};
pub use auth::{spawn_auth_worker, AuthCommand, AuthHandle, AuthSession, EncryptionSettings};
pub use config::load as load_config;
pub use config::Config;
pub use crypto::{EncryptedField, KdfParams};
pub use db::{Database, FieldCipher, PlaintextCipher};
pub use enums::{AuthState, Frequency, KdfMethod, NotificationKind};
pub use error::{AuthError, CoreError, Result as CoreResult};
pub use models::{DailyNote, Project, ScheduledNotification, Task, TaskFilter};
pub use recurrence::{next_occurrence, RecurrenceRule};
pub use reminders::{Notifier, ReminderMessage, ReminderPolicy, ReminderScheduler, TaskEvent};
