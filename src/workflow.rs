// src/workflow.rs
//! Task operations that span storage and the recurrence engine

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, info};

use crate::consts::LOCKED_PLACEHOLDER;
use crate::db::{Database, FieldCipher};
use crate::error::{CoreError, Result};
use crate::models::{Task, TaskFilter};
use crate::recurrence::{next_occurrence, occurs_on};

/// Save a new task at the end of the open list.
///
/// A recurring task with a due date and no explicit start gets its due date
/// as the rule's `starts_on`, which fixes the phase of "every N weeks".
pub async fn add_task(db: &Database, cipher: &impl FieldCipher, mut task: Task) -> Result<Task> {
    if task.title.trim().is_empty() {
        return Err(CoreError::Validation("task title is empty".into()));
    }
    if let (Some(rule), Some(due)) = (&task.recurrence, task.due_date) {
        if rule.starts_on().is_none() {
            task.recurrence = Some(rule.with_starts_on(due)?);
        }
    }

    task.id = None;
    task.sort_order = db.next_sort_order().await?;
    let id = db.save_task(cipher, &task).await?;
    task.id = Some(id);
    debug!(task_id = id, recurring = task.is_recurring(), "task added");
    Ok(task)
}

/// Mark a task done and, for a recurring one, create its next instance.
///
/// Returns the new instance, or `None` when the task is not recurring, the
/// series has ended, or an open task with the same title already exists on
/// the next date. That last check compares decrypted titles: every open
/// task due on that date is loaded and opened, then compared in memory.
pub async fn complete_task(
    db: &Database,
    cipher: &impl FieldCipher,
    task_id: i64,
    today: NaiveDate,
) -> Result<Option<Task>> {
    let task = db
        .load_task(cipher, task_id)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("task {task_id} does not exist")))?;
    if task.done {
        return Ok(None);
    }
    // A locked title cannot seed the next instance
    if task.is_recurring() && task.title == LOCKED_PLACEHOLDER {
        return Err(CoreError::LockedPlaceholderWrite);
    }

    let completed_at = today.and_time(Local::now().time());
    let Some(rule) = &task.recurrence else {
        db.set_task_done(task_id, true, Some(completed_at)).await?;
        return Ok(None);
    };

    // Next instance first: a failure here leaves the task open for a retry
    let anchor = task.due_date.unwrap_or(today);
    let next = match next_occurrence(rule, anchor, Some(today), today) {
        None => {
            info!(task_id, "recurring series ended");
            None
        }
        Some(next_due) => {
            let existing = db
                .find_tasks_by_title(cipher, &TaskFilter::pending().due_on(next_due), &task.title)
                .await?;
            if existing.is_empty() {
                let mut next = task.next_instance(next_due);
                next.id = Some(db.save_task(cipher, &next).await?);
                info!(task_id, next_id = ?next.id, %next_due, "next instance created");
                Some(next)
            } else {
                debug!(task_id, %next_due, "next instance already exists");
                None
            }
        }
    };

    db.set_task_done(task_id, true, Some(completed_at)).await?;
    Ok(next)
}

/// Reopen a completed task
pub async fn uncomplete_task(db: &Database, task_id: i64) -> Result<bool> {
    db.set_task_done(task_id, false, None).await
}

/// Move a task one day later (from today when it has no due date)
pub async fn postpone_task(db: &Database, task_id: i64, today: NaiveDate) -> Result<NaiveDate> {
    let current = db.pending_due_date(task_id).await?.unwrap_or(today);
    let next = current
        .checked_add_days(Days::new(1))
        .ok_or_else(|| CoreError::Validation("due date out of range".into()))?;
    if !db.set_task_due_date(task_id, Some(next)).await? {
        return Err(CoreError::Validation(format!("task {task_id} does not exist")));
    }
    Ok(next)
}

pub async fn duplicate_task(db: &Database, cipher: &impl FieldCipher, task_id: i64) -> Result<Task> {
    let original = db
        .load_task(cipher, task_id)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("task {task_id} does not exist")))?;
    let mut copy = original.clone();
    copy.id = None;
    copy.title = format!("{} (copy)", original.title);
    copy.id = Some(db.save_task(cipher, &copy).await?);
    Ok(copy)
}

/// Delete a task, or its whole series when it is recurring. Series members
/// are matched by decrypted title.
pub async fn delete_series(db: &Database, cipher: &impl FieldCipher, task: &Task) -> Result<usize> {
    if task.is_recurring() {
        return db.delete_recurring_tasks_by_title(cipher, &task.title).await;
    }
    let Some(id) = task.id else { return Ok(0) };
    Ok(usize::from(db.delete_task(id).await?))
}

/// The "today" view: recurring tasks that are due or overdue only show on
/// days their pattern is scheduled. Everything else passes through.
pub fn filter_for_today(tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| match (&task.recurrence, task.due_date) {
            (Some(rule), Some(due)) if due <= today => occurs_on(rule, today),
            _ => true,
        })
        .collect()
}
