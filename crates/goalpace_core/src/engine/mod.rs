//! Recurrence and planning engine.
//!
//! # Responsibility
//! - Count and project occurrences of recurrence rules.
//! - Decompose goals into per-occurrence quotas and project ideal pacing.
//! - Select tasks due on a calendar day and rank task lists.
//! - Compute completion/progress deltas for the storage layer to apply.
//!
//! # Invariants
//! - Every function is synchronous and side-effect free; the current time
//!   is always an explicit input.
//! - All quantities use exact decimals with explicit rounding.

pub mod decompose;
pub mod due;
pub mod error;
pub mod ideal;
pub mod occurrence;
pub mod progress;
pub mod ranking;
