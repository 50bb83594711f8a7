//! Goal domain model.
//!
//! # Responsibility
//! - Define the quantified target record that tasks contribute progress to.
//! - Validate business rules before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another goal.
//! - `target_quantity` is at least `0.0001`.
//! - `current_progress` is never negative and only changes through task
//!   completion/progress deltas, never through planning.
//! - `difficulty` and `importance` are within `1..=5` when set.

use crate::model::frequency::{GoalStatus, Unit};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GoalId = Uuid;

/// Smallest accepted target quantity (four decimal places).
pub const MIN_TARGET_QUANTITY: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

const RATING_MIN: u8 = 1;
const RATING_MAX: u8 = 5;

/// Validation failures for goal business rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    NilId,
    BlankName,
    TargetTooSmall { target: Decimal },
    NegativeProgress { progress: Decimal },
    DifficultyOutOfRange(u8),
    ImportanceOutOfRange(u8),
    DeadlineNotInFuture { deadline: NaiveDateTime },
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "goal id must not be nil"),
            Self::BlankName => write!(f, "goal name is required"),
            Self::TargetTooSmall { target } => write!(
                f,
                "target_quantity must be at least {MIN_TARGET_QUANTITY}, got {target}"
            ),
            Self::NegativeProgress { progress } => {
                write!(f, "current_progress must not be negative, got {progress}")
            }
            Self::DifficultyOutOfRange(value) => {
                write!(f, "difficulty must be between 1 and 5, got {value}")
            }
            Self::ImportanceOutOfRange(value) => {
                write!(f, "importance must be between 1 and 5, got {value}")
            }
            Self::DeadlineNotInFuture { deadline } => {
                write!(f, "deadline must be in the future, got {deadline}")
            }
        }
    }
}

impl Error for GoalValidationError {}

/// Quantified target with a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<Unit>,
    pub target_quantity: Decimal,
    pub current_progress: Decimal,
    pub deadline: NaiveDateTime,
    pub difficulty: Option<u8>,
    pub importance: Option<u8>,
    pub reason: Option<String>,
    pub reward: Option<String>,
    pub punishment: Option<String>,
    pub status: GoalStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    /// Soft delete tombstone.
    pub is_deleted: bool,
}

impl Goal {
    /// Creates a goal with a generated id and zero progress.
    pub fn new(
        name: impl Into<String>,
        target_quantity: Decimal,
        deadline: NaiveDateTime,
        status: GoalStatus,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            unit: None,
            target_quantity,
            current_progress: Decimal::ZERO,
            deadline,
            difficulty: None,
            importance: None,
            reason: None,
            reward: None,
            punishment: None,
            status,
            created_at,
            updated_at: None,
            completed_at: None,
            is_deleted: false,
        }
    }

    /// Validates record-level invariants (no clock involved).
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.id.is_nil() {
            return Err(GoalValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::BlankName);
        }
        if self.target_quantity < MIN_TARGET_QUANTITY {
            return Err(GoalValidationError::TargetTooSmall {
                target: self.target_quantity,
            });
        }
        if self.current_progress < Decimal::ZERO {
            return Err(GoalValidationError::NegativeProgress {
                progress: self.current_progress,
            });
        }
        if let Some(value) = self.difficulty {
            if !(RATING_MIN..=RATING_MAX).contains(&value) {
                return Err(GoalValidationError::DifficultyOutOfRange(value));
            }
        }
        if let Some(value) = self.importance {
            if !(RATING_MIN..=RATING_MAX).contains(&value) {
                return Err(GoalValidationError::ImportanceOutOfRange(value));
            }
        }
        Ok(())
    }

    /// Validates write-time rules that depend on the current clock.
    ///
    /// Only create/update paths call this; stored goals may legitimately
    /// have passed their deadline.
    pub fn validate_for_write(&self, now: NaiveDateTime) -> Result<(), GoalValidationError> {
        self.validate()?;
        if self.deadline <= now {
            return Err(GoalValidationError::DeadlineNotInFuture {
                deadline: self.deadline,
            });
        }
        Ok(())
    }

    /// Returns whether the target has been reached.
    pub fn is_target_reached(&self) -> bool {
        self.current_progress >= self.target_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::{Goal, GoalValidationError};
    use crate::model::frequency::GoalStatus;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn goal() -> Goal {
        Goal::new(
            "run",
            Decimal::from(100),
            at(20),
            GoalStatus::new(1, "active"),
            at(1),
        )
    }

    #[test]
    fn target_below_minimum_is_rejected() {
        let mut goal = goal();
        goal.target_quantity = Decimal::new(5, 5);
        assert!(matches!(
            goal.validate(),
            Err(GoalValidationError::TargetTooSmall { .. })
        ));

        goal.target_quantity = Decimal::new(1, 4);
        assert!(goal.validate().is_ok());
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        let mut goal = goal();
        goal.importance = Some(6);
        assert_eq!(
            goal.validate(),
            Err(GoalValidationError::ImportanceOutOfRange(6))
        );

        goal.importance = Some(5);
        goal.difficulty = Some(0);
        assert_eq!(
            goal.validate(),
            Err(GoalValidationError::DifficultyOutOfRange(0))
        );
    }

    #[test]
    fn write_validation_requires_future_deadline() {
        let goal = goal();
        assert!(goal.validate_for_write(at(2)).is_ok());
        assert!(matches!(
            goal.validate_for_write(at(20)),
            Err(GoalValidationError::DeadlineNotInFuture { .. })
        ));
    }
}
