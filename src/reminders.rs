// src/reminders.rs
//! Due-date reminders
//!
//! Trigger times are planned from a task's due date, persisted in
//! `scheduled_notifications`, and delivered by a polling loop through a
//! platform [`Notifier`]. Stored rows carry no task text; the title is
//! opened at delivery time and replaced by a generic line while locked.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::consts::{
    DEFAULT_DUE_HOUR, DEFAULT_REMINDER_OFFSET_MINUTES, DEFAULT_REMINDER_POLL_SECS,
    LOCKED_PLACEHOLDER,
};
use crate::db::{Database, FieldCipher};
use crate::error::Result;
use crate::models::ScheduledNotification;

pub const REMINDER_TITLE: &str = "Task reminder";
pub const LOCKED_REMINDER_BODY: &str = "Unlock to see details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub enabled: bool,
    /// Lead times before the due moment
    pub offsets_minutes: Vec<u32>,
    /// Time of day a bare due date stands for
    pub due_time: NaiveTime,
    /// (start, end), inclusive; start > end wraps midnight
    pub quiet_hours: Option<(NaiveTime, NaiveTime)>,
    pub poll_interval: Duration,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        ReminderPolicy {
            enabled: true,
            offsets_minutes: vec![DEFAULT_REMINDER_OFFSET_MINUTES],
            due_time: NaiveTime::from_hms_opt(DEFAULT_DUE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN),
            quiet_hours: None,
            poll_interval: Duration::from_secs(DEFAULT_REMINDER_POLL_SECS),
        }
    }
}

impl ReminderPolicy {
    pub fn in_quiet_hours(&self, at: NaiveTime) -> bool {
        match self.quiet_hours {
            None => false,
            Some((start, end)) if start > end => at >= start || at <= end,
            Some((start, end)) => start <= at && at <= end,
        }
    }
}

/// Future trigger times for a task due on `due_date`, earliest first
pub fn plan_reminders(
    policy: &ReminderPolicy,
    due_date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    if !policy.enabled {
        return Vec::new();
    }
    let due = due_date.and_time(policy.due_time);

    let mut triggers: Vec<NaiveDateTime> = policy
        .offsets_minutes
        .iter()
        .filter_map(|&m| due.checked_sub_signed(TimeDelta::minutes(i64::from(m))))
        .filter(|t| *t > now)
        .collect();
    triggers.sort();
    triggers.dedup();
    triggers
}

/// What a platform bridge is asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub title: String,
    pub body: String,
    pub task_id: Option<i64>,
}

/// Platform notification bridge (desktop toast, Android, …)
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &ReminderMessage) -> Result<()>;
}

/// Task lifecycle changes the scheduler reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Saved(i64),
    Completed(i64),
    Deleted(i64),
}

pub struct ReminderScheduler<N> {
    db: Arc<Database>,
    policy: ReminderPolicy,
    notifier: N,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(db: Arc<Database>, policy: ReminderPolicy, notifier: N) -> Self {
        ReminderScheduler {
            db,
            policy,
            notifier,
        }
    }

    pub fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Drop the task's unfired reminders and plan fresh ones from its
    /// current due date. Returns how many were scheduled.
    pub async fn reschedule_for_task(&self, task_id: i64, now: NaiveDateTime) -> Result<usize> {
        self.db.delete_unfired_notifications_for_task(task_id).await?;
        if !self.policy.enabled {
            return Ok(0);
        }

        let Some(due) = self.db.pending_due_date(task_id).await? else {
            return Ok(0);
        };

        let triggers = plan_reminders(&self.policy, due, now);
        for &at in &triggers {
            self.db
                .save_notification(&ScheduledNotification::due_reminder(task_id, at))
                .await?;
        }
        debug!(task_id, count = triggers.len(), "reminders scheduled");
        Ok(triggers.len())
    }

    pub async fn handle_event(&self, event: TaskEvent, now: NaiveDateTime) -> Result<()> {
        match event {
            TaskEvent::Saved(id) => {
                self.reschedule_for_task(id, now).await?;
            }
            TaskEvent::Completed(id) => {
                self.db.cancel_notifications_for_task(id).await?;
            }
            TaskEvent::Deleted(id) => {
                self.db.delete_unfired_notifications_for_task(id).await?;
            }
        }
        Ok(())
    }

    /// Deliver every pending reminder due at or before `now`.
    ///
    /// During quiet hours nothing is delivered and everything stays pending.
    /// A reminder whose delivery fails stays pending for the next pass.
    pub async fn process_due(&self, cipher: &impl FieldCipher, now: NaiveDateTime) -> Result<usize> {
        if !self.policy.enabled || self.policy.in_quiet_hours(now.time()) {
            return Ok(0);
        }

        let mut delivered = 0;
        for n in self.db.load_pending_notifications(now).await? {
            let Some(id) = n.id else { continue };
            let message = self.message_for(cipher, n.task_id).await;

            if let Err(e) = self.notifier.notify(&message) {
                warn!(notification_id = id, error = %e, "reminder delivery failed");
                continue;
            }
            self.db.mark_notification_delivered(id).await?;
            delivered += 1;
        }

        if delivered > 0 {
            info!(delivered, "reminders delivered");
        }
        Ok(delivered)
    }

    async fn message_for(&self, cipher: &impl FieldCipher, task_id: Option<i64>) -> ReminderMessage {
        let title = match task_id {
            Some(id) => match self.db.load_task(cipher, id).await {
                Ok(Some(task)) => Some(task.title),
                Ok(None) => None,
                Err(e) => {
                    warn!(task_id = id, error = %e, "could not load task for reminder");
                    None
                }
            },
            None => None,
        };

        let body = match title {
            Some(t) if t != LOCKED_PLACEHOLDER && !t.is_empty() => t,
            _ => LOCKED_REMINDER_BODY.to_owned(),
        };
        ReminderMessage {
            title: REMINDER_TITLE.to_owned(),
            body,
            task_id,
        }
    }

    /// Poll until `shutdown` flips to true (or its sender is dropped)
    pub async fn run(&self, cipher: &impl FieldCipher, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.policy.poll_interval);
        info!(every = ?self.policy.poll_interval, "reminder loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Local::now().naive_local();
                    if let Err(e) = self.process_due(cipher, now).await {
                        error!(error = %e, "reminder pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("reminder loop stopped");
    }

    /// Cancel every pending reminder, e.g. when the app shuts down for good
    pub async fn cleanup(&self) -> Result<usize> {
        self.db.cancel_all_pending_notifications().await
    }
}
