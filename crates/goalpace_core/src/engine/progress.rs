//! Task completion and progress deltas.
//!
//! # Responsibility
//! - Compute the next task state for completion, un-completion and
//!   incremental progress events.
//! - Compute the goal-progress delta each event implies.
//!
//! # Invariants
//! - Nothing here touches storage; callers apply the task state and the
//!   goal delta together in one transaction.
//! - A goal delta is only produced for tasks linked to a goal.
//! - Goal progress never drops below zero once a delta is applied.

use crate::engine::error::{PlanError, PlanResult};
use crate::model::task::Task;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Next task state plus the goal-progress change to apply with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPlan {
    pub task: Task,
    /// Signed change for the linked goal's `current_progress`.
    pub goal_delta: Option<Decimal>,
}

impl ProgressPlan {
    fn new(task: Task, delta: Decimal) -> Self {
        let goal_delta = task.goal_id.map(|_| delta);
        Self { task, goal_delta }
    }
}

/// Aligns `completed_at` with `progress >= quantity`.
///
/// Tasks without both a quantity and a progress value are left untouched.
/// An existing completion marker is kept when the task stays complete.
pub fn sync_completion(task: &mut Task, now: NaiveDateTime) {
    let (Some(quantity), Some(progress)) = (task.quantity, task.progress) else {
        return;
    };
    if progress >= quantity {
        task.completed_at.get_or_insert(now);
    } else {
        task.completed_at = None;
    }
}

/// Marks `task` complete; the goal gains the task quantity, or one unit
/// for quantity-less tasks.
pub fn plan_completion(task: &Task, now: NaiveDateTime) -> ProgressPlan {
    let mut next = task.clone();
    next.completed_at = Some(now);
    if let Some(quantity) = next.quantity {
        next.progress = Some(quantity);
    }
    let delta = task.quantity.unwrap_or(Decimal::ONE);
    ProgressPlan::new(next, delta)
}

/// Reverts completion of `task`; the goal loses what completion added.
pub fn plan_uncompletion(task: &Task) -> ProgressPlan {
    let mut next = task.clone();
    next.completed_at = None;
    if next.quantity.is_some() {
        next.progress = Some(Decimal::ZERO);
    }
    let delta = -task.quantity.unwrap_or(Decimal::ONE);
    ProgressPlan::new(next, delta)
}

/// Adds `quantity` (possibly negative) to the task progress.
///
/// Task progress is floored at zero and completion is re-synced; the goal
/// delta is the raw `quantity`.
///
/// # Errors
/// - `InvalidQuantity` when `quantity` is zero.
pub fn plan_progress(task: &Task, quantity: Decimal, now: NaiveDateTime) -> PlanResult<ProgressPlan> {
    if quantity.is_zero() {
        return Err(PlanError::InvalidQuantity {
            field: "quantity",
            value: quantity,
        });
    }

    let mut next = task.clone();
    let current = next.progress.unwrap_or(Decimal::ZERO);
    next.progress = Some((current + quantity).max(Decimal::ZERO));
    sync_completion(&mut next, now);
    Ok(ProgressPlan::new(next, quantity))
}

/// Goal delta implied by an edit that changed the completion state.
///
/// Only quantity-bearing tasks linked to a goal move goal progress on edit.
pub fn completion_transition_delta(was_completed: bool, task: &Task) -> Option<Decimal> {
    task.goal_id?;
    let quantity = task.quantity?;
    match (was_completed, task.is_completed()) {
        (false, true) => Some(quantity),
        (true, false) => Some(-quantity),
        _ => None,
    }
}

/// Applies `delta` to a goal progress value, flooring at zero.
pub fn apply_goal_delta(current: Decimal, delta: Decimal) -> Decimal {
    (current + delta).max(Decimal::ZERO)
}
