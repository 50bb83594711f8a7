//! Task domain model.
//!
//! # Responsibility
//! - Define one-off and recurring actions that feed progress into a goal.
//! - Keep the recurrence day-set aligned with the task frequency.
//! - Provide the ranked read model consumed by list use-cases.
//!
//! # Invariants
//! - Every task references exactly one frequency.
//! - Only the day-set matching the frequency kind is populated.
//! - `completed_at` is set iff `progress >= quantity` when `quantity` is set.
//! - Deleted tasks never reach planning inputs.

use crate::model::frequency::{Frequency, FrequencyKind, Unit};
use crate::model::goal::{Goal, GoalId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use uuid::Uuid;

pub type TaskId = Uuid;

pub const WEEK_DAY_RANGE: RangeInclusive<u32> = 1..=7;
pub const MONTH_DAY_RANGE: RangeInclusive<u32> = 1..=31;
pub const YEAR_DAY_RANGE: RangeInclusive<u32> = 1..=366;

/// Validation failures for task business rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    BlankName,
    NonPositiveQuantity { quantity: Decimal },
    NegativeProgress { progress: Decimal },
    DayOutOfRange { set: &'static str, day: u32 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::BlankName => write!(f, "task name is required"),
            Self::NonPositiveQuantity { quantity } => {
                write!(f, "task quantity must be positive, got {quantity}")
            }
            Self::NegativeProgress { progress } => {
                write!(f, "task progress must not be negative, got {progress}")
            }
            Self::DayOutOfRange { set, day } => write!(f, "{set} contains invalid day {day}"),
        }
    }
}

impl Error for TaskValidationError {}

/// One-off or recurring action, optionally linked to a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: Option<String>,
    pub goal_id: Option<GoalId>,
    pub frequency: Frequency,
    /// Fixed quantity contributed per occurrence.
    pub quantity: Option<Decimal>,
    /// Cumulative progress toward `quantity`.
    pub progress: Option<Decimal>,
    pub overflow_quantity: Decimal,
    pub completed_at: Option<NaiveDateTime>,
    pub urgent: bool,
    /// ISO weekday numbers, Monday = 1.
    pub week_days: BTreeSet<u32>,
    pub month_days: BTreeSet<u32>,
    pub year_days: BTreeSet<u32>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    /// Soft delete tombstone.
    pub is_deleted: bool,
}

impl Task {
    /// Creates a task with a generated id and empty recurrence sets.
    pub fn new(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            goal_id: None,
            frequency,
            quantity: None,
            progress: None,
            overflow_quantity: Decimal::ZERO,
            completed_at: None,
            urgent: false,
            week_days: BTreeSet::new(),
            month_days: BTreeSet::new(),
            year_days: BTreeSet::new(),
            created_at: None,
            updated_at: None,
            is_deleted: false,
        }
    }

    /// Replaces the recurrence day-set that matches the current frequency.
    ///
    /// All three sets are cleared first; one-time, daily and unknown
    /// frequencies keep every set empty.
    pub fn assign_selected_days(&mut self, days: impl IntoIterator<Item = u32>) {
        self.week_days.clear();
        self.month_days.clear();
        self.year_days.clear();

        let target = match self.frequency.kind() {
            Some(FrequencyKind::Weekly) => &mut self.week_days,
            Some(FrequencyKind::Monthly) => &mut self.month_days,
            Some(FrequencyKind::Yearly) => &mut self.year_days,
            _ => return,
        };
        target.extend(days);
    }

    /// Returns the day-set matching the current frequency, ascending.
    pub fn selected_days(&self) -> Vec<u32> {
        match self.frequency.kind() {
            Some(FrequencyKind::Weekly) => self.week_days.iter().copied().collect(),
            Some(FrequencyKind::Monthly) => self.month_days.iter().copied().collect(),
            Some(FrequencyKind::Yearly) => self.year_days.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(TaskValidationError::BlankName);
        }
        if let Some(quantity) = self.quantity {
            if quantity <= Decimal::ZERO {
                return Err(TaskValidationError::NonPositiveQuantity { quantity });
            }
        }
        if let Some(progress) = self.progress {
            if progress < Decimal::ZERO {
                return Err(TaskValidationError::NegativeProgress { progress });
            }
        }
        check_days("week_days", &self.week_days, WEEK_DAY_RANGE)?;
        check_days("month_days", &self.month_days, MONTH_DAY_RANGE)?;
        check_days("year_days", &self.year_days, YEAR_DAY_RANGE)?;
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }
}

fn check_days(
    set: &'static str,
    days: &BTreeSet<u32>,
    range: RangeInclusive<u32>,
) -> Result<(), TaskValidationError> {
    match days.iter().find(|day| !range.contains(day)) {
        Some(&day) => Err(TaskValidationError::DayOutOfRange { set, day }),
        None => Ok(()),
    }
}

/// Read model for task list use-cases.
///
/// Carries the goal fields that ranking and presentation need so callers
/// never navigate back to the goal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: Task,
    pub goal_name: Option<String>,
    pub goal_importance: Option<u8>,
    pub goal_unit: Option<Unit>,
    /// 1-based base rank; `0` until assigned by ranking.
    pub order: usize,
}

impl TaskRecord {
    /// Builds a record from a task and its resolved goal, if any.
    pub fn new(task: Task, goal: Option<&Goal>) -> Self {
        Self {
            task,
            goal_name: goal.map(|goal| goal.name.clone()),
            goal_importance: goal.and_then(|goal| goal.importance),
            goal_unit: goal.and_then(|goal| goal.unit.clone()),
            order: 0,
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.task.urgent
    }
}
