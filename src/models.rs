// src/models.rs
//! Row types for the task store
//!
//! Text fields here are always plaintext (or the locked placeholder);
//! the ciphertext form only exists inside `db`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::enums::NotificationKind;
use crate::recurrence::RecurrenceRule;

pub const DEFAULT_ESTIMATED_SECONDS: i64 = 900;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub notes: String,
    pub project_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub done: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub recurrence: Option<RecurrenceRule>,
    pub sort_order: i64,
    pub estimated_seconds: i64,
    pub spent_seconds: i64,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            id: None,
            title: title.into(),
            notes: String::new(),
            project_id: None,
            due_date: None,
            done: false,
            completed_at: None,
            recurrence: None,
            sort_order: 0,
            estimated_seconds: DEFAULT_ESTIMATED_SECONDS,
            spent_seconds: 0,
        }
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Fresh, unsaved copy for the next date in the series
    pub fn next_instance(&self, due: NaiveDate) -> Task {
        Task {
            id: None,
            title: self.title.clone(),
            notes: self.notes.clone(),
            project_id: self.project_id.clone(),
            due_date: Some(due),
            done: false,
            completed_at: None,
            recurrence: self.recurrence.clone(),
            sort_order: self.sort_order,
            estimated_seconds: self.estimated_seconds,
            spent_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNote {
    pub date: NaiveDate,
    pub content: String,
    pub updated_at: Option<NaiveDateTime>,
}

/// A persisted reminder. Holds no task text; the title is looked up
/// (and decrypted, if possible) at delivery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: Option<i64>,
    pub kind: NotificationKind,
    pub task_id: Option<i64>,
    pub trigger_at: NaiveDateTime,
    pub delivered: bool,
    pub canceled: bool,
}

impl ScheduledNotification {
    pub fn due_reminder(task_id: i64, trigger_at: NaiveDateTime) -> Self {
        ScheduledNotification {
            id: None,
            kind: NotificationKind::DueReminder,
            task_id: Some(task_id),
            trigger_at,
            delivered: false,
            canceled: false,
        }
    }
}

/// Non-encrypted predicates for task queries. Encrypted columns are never
/// filterable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub done: Option<bool>,
    pub due_on: Option<NaiveDate>,
    pub due_on_or_before: Option<NaiveDate>,
    pub due_after: Option<NaiveDate>,
    pub no_due_date: bool,
    pub project_ids: Vec<String>,
    pub recurring_only: bool,
    pub limit: Option<u32>,
}

impl TaskFilter {
    pub fn pending() -> Self {
        TaskFilter {
            done: Some(false),
            ..Default::default()
        }
    }

    pub fn done() -> Self {
        TaskFilter {
            done: Some(true),
            ..Default::default()
        }
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_on = Some(date);
        self
    }
}
