//! Core domain logic for goalpace.
//! Goal decomposition, pacing, due-today selection and task ranking over a
//! SQLite store.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use engine::decompose::{decompose, Decomposition};
pub use engine::due::{is_due, select_due, CalendarContext};
pub use engine::error::{PlanError, PlanResult};
pub use engine::ideal::ideal_progress;
pub use engine::occurrence::{count_occurrences, date_of_nth_occurrence};
pub use engine::progress::ProgressPlan;
pub use engine::ranking::rank_tasks;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::frequency::{Frequency, FrequencyKind, GoalStatus, Unit};
pub use model::goal::{Goal, GoalId, GoalValidationError};
pub use model::task::{Task, TaskId, TaskRecord, TaskValidationError};
pub use repo::error::{RepoError, RepoResult};
pub use repo::goal_repo::{GoalRepository, SqliteGoalRepository};
pub use repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
pub use service::error::{ServiceError, ServiceResult, ValidationError};
pub use service::goal_service::{DecompositionRequest, GoalDraft, GoalRecord, GoalService};
pub use service::task_service::{TaskDraft, TaskService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
