//! Domain model for goals, tasks and their reference data.
//!
//! # Responsibility
//! - Define the value snapshots passed between storage, services and engine.
//! - Enforce record-level business rules via `validate()`.
//!
//! # Invariants
//! - Goals and tasks are identified by stable UUIDs.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - Records hold resolved values only; there are no back-references.

pub mod frequency;
pub mod goal;
pub mod task;
