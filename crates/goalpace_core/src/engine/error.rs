//! Planning engine error kinds.

use crate::model::goal::GoalId;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PlanResult<T> = Result<T, PlanError>;

/// Errors produced by pure planning computations.
///
/// Every variant carries enough context for callers to build a
/// user-facing message without re-reading inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Frequency name is outside the known recurrence kinds.
    UnsupportedFrequency { name: String },
    /// The frequency yields no occurrence before the goal deadline.
    NoOccurrencesLeft { goal_id: GoalId, frequency: String },
    /// A quantity that must be non-zero/positive was not.
    InvalidQuantity { field: &'static str, value: Decimal },
    /// Advancing by `n` occurrences leaves the representable calendar.
    DateOutOfRange { frequency: String, n: u64 },
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFrequency { name } => write!(f, "unsupported frequency: `{name}`"),
            Self::NoOccurrencesLeft { goal_id, frequency } => write!(
                f,
                "no occurrences left for frequency `{frequency}` before the deadline of goal {goal_id}"
            ),
            Self::InvalidQuantity { field, value } => {
                write!(f, "invalid quantity for `{field}`: {value}")
            }
            Self::DateOutOfRange { frequency, n } => write!(
                f,
                "date of occurrence {n} for frequency `{frequency}` is out of range"
            ),
        }
    }
}

impl Error for PlanError {}
