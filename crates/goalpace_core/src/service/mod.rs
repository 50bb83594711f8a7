//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and engine computations into use-case
//!   level APIs for goals and tasks.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Every clock-dependent operation has an `_at(now)` variant; the plain
//!   variant reads the local wall clock once and delegates.
//! - The wall clock is truncated to milliseconds, the precision timestamps
//!   are stored at, so returned records match what a later read returns.

use chrono::{Local, NaiveDateTime, SubsecRound};

pub mod error;
pub mod goal_service;
pub mod task_service;

pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::local_now;
    use chrono::Timelike;

    #[test]
    fn local_now_keeps_whole_milliseconds() {
        assert_eq!(local_now().nanosecond() % 1_000_000, 0);
    }
}
