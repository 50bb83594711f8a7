//! Occurrence counting and projection for recurrence kinds.
//!
//! # Invariants
//! - Both range ends are truncated to midnight before any comparison.
//! - An empty or reversed range counts zero occurrences for every name,
//!   including unsupported ones.
//! - Month/year additions clamp to the last valid day of the target month.

use crate::engine::error::{PlanError, PlanResult};
use crate::model::frequency::{Frequency, FrequencyKind};
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

const DAYS_PER_WEEK: i64 = 7;
const MONTHS_PER_YEAR: i64 = 12;

/// Resolves the recurrence kind or fails with `UnsupportedFrequency`.
pub fn frequency_kind(frequency: &Frequency) -> PlanResult<FrequencyKind> {
    frequency
        .kind()
        .ok_or_else(|| PlanError::UnsupportedFrequency {
            name: frequency.name.clone(),
        })
}

/// Truncates a timestamp to midnight of the same day.
pub fn truncate_to_day(value: NaiveDateTime) -> NaiveDateTime {
    value.date().and_time(NaiveTime::MIN)
}

/// Counts occurrences of `frequency` between `from` and `to`.
///
/// Returns `0` when `to` is not strictly after `from` once both are
/// truncated to whole days. One-time frequencies always count exactly one
/// occurrence inside a non-empty range.
pub fn count_occurrences(
    frequency: &Frequency,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> PlanResult<i64> {
    let start = from.date();
    let end = to.date();
    let days_between = (end - start).num_days();
    if days_between <= 0 {
        return Ok(0);
    }

    let count = match frequency_kind(frequency)? {
        FrequencyKind::Daily => days_between,
        FrequencyKind::Weekly => days_between / DAYS_PER_WEEK,
        FrequencyKind::Monthly => whole_months_between(start, end),
        FrequencyKind::Yearly => whole_months_between(start, end) / MONTHS_PER_YEAR,
        FrequencyKind::OneTime => 1,
    };
    Ok(count)
}

/// Returns midnight of the day `n` occurrences after `from`.
///
/// One-time frequencies advance by `n` days.
pub fn date_of_nth_occurrence(
    frequency: &Frequency,
    from: NaiveDateTime,
    n: u64,
) -> PlanResult<NaiveDateTime> {
    let kind = frequency_kind(frequency)?;
    let start = from.date();

    let date = match kind {
        FrequencyKind::Daily | FrequencyKind::OneTime => start.checked_add_days(Days::new(n)),
        FrequencyKind::Weekly => n
            .checked_mul(DAYS_PER_WEEK as u64)
            .and_then(|days| start.checked_add_days(Days::new(days))),
        FrequencyKind::Monthly => u32::try_from(n)
            .ok()
            .and_then(|months| start.checked_add_months(Months::new(months))),
        FrequencyKind::Yearly => n
            .checked_mul(MONTHS_PER_YEAR as u64)
            .and_then(|months| u32::try_from(months).ok())
            .and_then(|months| start.checked_add_months(Months::new(months))),
    };

    date.map(|date| date.and_time(NaiveTime::MIN))
        .ok_or_else(|| PlanError::DateOutOfRange {
            frequency: frequency.name.clone(),
            n,
        })
}

/// Whole calendar months from `start` to `end` (`end` after `start`).
///
/// A month only counts once the day-of-month of `start` has been reached.
fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let start_month = i64::from(start.year()) * MONTHS_PER_YEAR + i64::from(start.month0());
    let end_month = i64::from(end.year()) * MONTHS_PER_YEAR + i64::from(end.month0());
    let mut months = end_month - start_month;
    if months > 0 && end.day() < start.day() {
        months -= 1;
    }
    months
}
