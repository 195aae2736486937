// src/recurrence.rs
//! Recurrence engine: pure date math for repeating tasks
//!
//! A [`RecurrenceRule`] is validated once, when it is built or
//! deserialized, so [`next_occurrence`] never has to report a bad rule.
//! Weekdays use 0 = Monday … 6 = Sunday throughout.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::enums::Frequency;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    weekdays: BTreeSet<u8>,
    from_completion: bool,
    until: Option<NaiveDate>,
    starts_on: Option<NaiveDate>,
}

/// Unvalidated wire shape; every deserialized rule goes through `build`
#[derive(Deserialize)]
#[serde(default)]
struct RawRule {
    frequency: Frequency,
    interval: u32,
    weekdays: BTreeSet<u8>,
    from_completion: bool,
    until: Option<NaiveDate>,
    starts_on: Option<NaiveDate>,
}

impl Default for RawRule {
    fn default() -> Self {
        RawRule {
            frequency: Frequency::default(),
            interval: 1,
            weekdays: BTreeSet::new(),
            from_completion: false,
            until: None,
            starts_on: None,
        }
    }
}

impl TryFrom<RawRule> for RecurrenceRule {
    type Error = CoreError;

    fn try_from(raw: RawRule) -> Result<Self> {
        RecurrenceRuleBuilder {
            frequency: raw.frequency,
            interval: raw.interval,
            weekdays: raw.weekdays,
            from_completion: raw.from_completion,
            until: raw.until,
            starts_on: raw.starts_on,
        }
        .build()
    }
}

#[derive(Debug, Clone)]
pub struct RecurrenceRuleBuilder {
    frequency: Frequency,
    interval: u32,
    weekdays: BTreeSet<u8>,
    from_completion: bool,
    until: Option<NaiveDate>,
    starts_on: Option<NaiveDate>,
}

impl RecurrenceRuleBuilder {
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn weekdays(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = days.into_iter().collect();
        self
    }

    pub fn from_completion(mut self, yes: bool) -> Self {
        self.from_completion = yes;
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    pub fn starts_on(mut self, date: NaiveDate) -> Self {
        self.starts_on = Some(date);
        self
    }

    pub fn build(self) -> Result<RecurrenceRule> {
        if self.interval == 0 {
            return Err(CoreError::Validation(
                "recurrence interval must be at least 1".into(),
            ));
        }
        if !self.weekdays.is_empty() && self.frequency != Frequency::Weeks {
            return Err(CoreError::Validation(
                "weekdays are only allowed on weekly rules".into(),
            ));
        }
        if let Some(bad) = self.weekdays.iter().find(|&&d| d > 6) {
            return Err(CoreError::Validation(format!(
                "weekday {bad} out of range (0 = Monday … 6 = Sunday)"
            )));
        }
        if let (Some(start), Some(until)) = (self.starts_on, self.until) {
            if until < start {
                return Err(CoreError::Validation(format!(
                    "recurrence ends ({until}) before it starts ({start})"
                )));
            }
        }

        Ok(RecurrenceRule {
            frequency: self.frequency,
            interval: self.interval,
            weekdays: self.weekdays,
            from_completion: self.from_completion,
            until: self.until,
            starts_on: self.starts_on,
        })
    }
}

impl RecurrenceRule {
    pub fn builder(frequency: Frequency) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder {
            frequency,
            interval: 1,
            weekdays: BTreeSet::new(),
            from_completion: false,
            until: None,
            starts_on: None,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn weekdays(&self) -> &BTreeSet<u8> {
        &self.weekdays
    }

    pub fn from_completion(&self) -> bool {
        self.from_completion
    }

    pub fn until(&self) -> Option<NaiveDate> {
        self.until
    }

    pub fn starts_on(&self) -> Option<NaiveDate> {
        self.starts_on
    }

    /// Same rule, phase-anchored at `date`. Re-validated.
    pub fn with_starts_on(&self, date: NaiveDate) -> Result<Self> {
        self.to_builder().starts_on(date).build()
    }

    pub fn to_builder(&self) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder {
            frequency: self.frequency,
            interval: self.interval,
            weekdays: self.weekdays.clone(),
            from_completion: self.from_completion,
            until: self.until,
            starts_on: self.starts_on,
        }
    }
}

/// Next due date of a series, or `None` when the series has ended.
///
/// `anchor` is the current due date. With `from_completion` the anchor is
/// replaced by `completed_on`, or by `today` when the task is completed
/// without a date. Results past `until` and date overflow both end the
/// series.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    anchor: NaiveDate,
    completed_on: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let base = if rule.from_completion {
        completed_on.unwrap_or(today)
    } else {
        anchor
    };

    let next = match rule.frequency {
        Frequency::Days => base.checked_add_days(Days::new(u64::from(rule.interval))),
        Frequency::Weeks if rule.weekdays.is_empty() => {
            base.checked_add_days(Days::new(7 * u64::from(rule.interval)))
        }
        Frequency::Weeks => next_on_weekdays(rule, base),
        Frequency::Months => base.checked_add_months(Months::new(rule.interval)),
    }?;

    match rule.until {
        Some(until) if next > until => None,
        _ => Some(next),
    }
}

/// True when `date` is a scheduled day of the rule's weekly pattern.
/// Rules without weekdays match every day.
pub fn occurs_on(rule: &RecurrenceRule, date: NaiveDate) -> bool {
    if rule.weekdays.is_empty() {
        return true;
    }
    if !rule.weekdays.contains(&weekday_index(date)) {
        return false;
    }
    match rule.starts_on {
        Some(origin) => week_index(origin, date).rem_euclid(i64::from(rule.interval)) == 0,
        None => true,
    }
}

// "every N weeks on D1, D2…": weeks are counted Monday-to-Monday from the
// week containing `starts_on` (or `base` when the rule has no start date).
fn next_on_weekdays(rule: &RecurrenceRule, base: NaiveDate) -> Option<NaiveDate> {
    let interval = i64::from(rule.interval);
    let origin = rule.starts_on.unwrap_or(base);
    let base_monday = monday_of(base);
    let phase = week_index(origin, base).rem_euclid(interval);

    if phase == 0 {
        let today = weekday_index(base);
        if let Some(&day) = rule.weekdays.iter().find(|&&d| d > today) {
            return base_monday.checked_add_days(Days::new(u64::from(day)));
        }
    }

    let weeks_ahead = u64::try_from(interval - phase).ok()?;
    let first = *rule.weekdays.iter().next()?;
    base_monday
        .checked_add_days(Days::new(weeks_ahead * 7))?
        .checked_add_days(Days::new(u64::from(first)))
}

fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(NaiveDate::MIN)
}

fn week_index(origin: NaiveDate, date: NaiveDate) -> i64 {
    (monday_of(date) - monday_of(origin)).num_days().div_euclid(7)
}
