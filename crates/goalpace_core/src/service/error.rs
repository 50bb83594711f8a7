//! Service error shared by goal and task use-cases.

use crate::engine::error::PlanError;
use crate::model::goal::{GoalId, GoalValidationError};
use crate::model::task::{TaskId, TaskValidationError};
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for goal and task use-cases.
#[derive(Debug)]
pub enum ServiceError {
    GoalNotFound(GoalId),
    TaskNotFound(TaskId),
    FrequencyNotFound(i64),
    /// Status lookup failed; `key` is the requested id or name.
    StatusNotFound { key: String },
    UnitNotFound(String),
    /// Progress was reported for a task without a goal.
    TaskNotLinkedToGoal(TaskId),
    /// Progress was reported against a goal that has no unit.
    GoalWithoutUnit(GoalId),
    /// Planning engine rejected the request.
    Plan(PlanError),
    /// Input or state violates goal/task business rules.
    Validation(ValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

/// Business-rule violation from either aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Goal(GoalValidationError),
    Task(TaskValidationError),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Goal(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Goal(err) => Some(err),
            Self::Task(err) => Some(err),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GoalNotFound(id) => write!(f, "goal not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::FrequencyNotFound(id) => write!(f, "frequency not found: {id}"),
            Self::StatusNotFound { key } => write!(f, "goal status not found: {key}"),
            Self::UnitNotFound(code) => write!(f, "unit not found: {code}"),
            Self::TaskNotLinkedToGoal(id) => write!(f, "task {id} is not linked to any goal"),
            Self::GoalWithoutUnit(id) => write!(f, "goal {id} does not have a unit"),
            Self::Plan(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Plan(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::GoalNotFound(id) => Self::GoalNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::GoalValidation(err) => Self::Validation(ValidationError::Goal(err)),
            RepoError::TaskValidation(err) => Self::Validation(ValidationError::Task(err)),
            other => Self::Repo(other),
        }
    }
}

impl From<PlanError> for ServiceError {
    fn from(value: PlanError) -> Self {
        Self::Plan(value)
    }
}

impl From<GoalValidationError> for ServiceError {
    fn from(value: GoalValidationError) -> Self {
        Self::Validation(ValidationError::Goal(value))
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(ValidationError::Task(value))
    }
}
