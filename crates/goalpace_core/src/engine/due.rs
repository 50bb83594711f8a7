//! Due-today selection for recurring tasks.
//!
//! # Responsibility
//! - Describe "today" as a calendar position independent of any clock.
//! - Decide per task whether its recurrence rule fires today.
//!
//! # Invariants
//! - Days configured beyond the current month/year length fire on the last
//!   day of that period, but only when every configured day lies beyond
//!   today.
//! - An empty day-set never fires.
//! - Soft-deleted tasks are never selected.

use crate::engine::error::PlanResult;
use crate::engine::occurrence::frequency_kind;
use crate::model::frequency::FrequencyKind;
use crate::model::task::Task;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Calendar position of "today" used by due-today selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarContext {
    /// ISO weekday, Monday = 1 through Sunday = 7.
    pub weekday: u32,
    pub day_of_month: u32,
    pub is_last_day_of_month: bool,
    pub day_of_year: u32,
    pub is_last_day_of_year: bool,
    pub include_one_time: bool,
}

impl CalendarContext {
    /// Derives the calendar position of `date`.
    pub fn for_date(date: NaiveDate, include_one_time: bool) -> Self {
        let is_last_day_of_month = date
            .succ_opt()
            .map_or(true, |next| next.month() != date.month());
        let is_last_day_of_year = date
            .succ_opt()
            .map_or(true, |next| next.year() != date.year());

        Self {
            weekday: date.weekday().number_from_monday(),
            day_of_month: date.day(),
            is_last_day_of_month,
            day_of_year: date.ordinal(),
            is_last_day_of_year,
            include_one_time,
        }
    }
}

/// Returns whether `task` is due on the day described by `ctx`.
///
/// Deleted tasks are never due.
///
/// # Errors
/// - `UnsupportedFrequency` when the task frequency name is unknown.
pub fn is_due(task: &Task, ctx: &CalendarContext) -> PlanResult<bool> {
    if task.is_deleted {
        return Ok(false);
    }

    let due = match frequency_kind(&task.frequency)? {
        FrequencyKind::OneTime => ctx.include_one_time,
        FrequencyKind::Daily => true,
        FrequencyKind::Weekly => task.week_days.contains(&ctx.weekday),
        FrequencyKind::Monthly => {
            fires_with_roll_up(&task.month_days, ctx.day_of_month, ctx.is_last_day_of_month)
        }
        FrequencyKind::Yearly => {
            fires_with_roll_up(&task.year_days, ctx.day_of_year, ctx.is_last_day_of_year)
        }
    };
    Ok(due)
}

/// Filters `tasks` down to the ones due on the day described by `ctx`,
/// keeping input order.
pub fn select_due<'a, I>(tasks: I, ctx: &CalendarContext) -> PlanResult<Vec<&'a Task>>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut due = Vec::new();
    for task in tasks {
        if is_due(task, ctx)? {
            due.push(task);
        }
    }
    Ok(due)
}

fn fires_with_roll_up(days: &BTreeSet<u32>, today: u32, is_last_day: bool) -> bool {
    if days.contains(&today) {
        return true;
    }
    is_last_day && !days.is_empty() && days.iter().all(|day| *day > today)
}
