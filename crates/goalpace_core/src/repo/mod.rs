//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for goals, tasks and
//!   reference data.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce model validation before persistence.
//! - Repository APIs return semantic errors (`GoalNotFound`, `TaskNotFound`)
//!   in addition to DB transport errors.

pub(crate) mod codec;
pub mod error;
pub mod goal_repo;
pub mod reference_repo;
pub mod task_repo;
