//! Goal use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list/delete entry points for goals.
//! - Resolve unit and status references from caller input.
//! - Attach the ideal-progress projection to every goal read.
//! - Run goal decomposition against stored goals and frequencies.
//!
//! # Invariants
//! - Writes run `Goal::validate_for_write` against the service clock.
//! - A goal is `completed_at`-stamped iff its status was set to `completed`.
//! - Deleting an already deleted goal is a no-op.

use crate::engine::decompose::{decompose, Decomposition};
use crate::engine::ideal::ideal_progress;
use crate::model::frequency::{GoalStatus, Unit};
use crate::model::goal::{Goal, GoalId};
use crate::repo::goal_repo::GoalRepository;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::local_now;
use chrono::NaiveDateTime;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Caller input for creating or updating a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub name: String,
    pub description: Option<String>,
    /// Unit code, resolved case-insensitively. `None` keeps the current unit
    /// on update.
    pub unit_code: Option<String>,
    pub target_quantity: Decimal,
    /// Defaults to zero on create; `None` keeps the current value on update.
    pub current_progress: Option<Decimal>,
    pub deadline: NaiveDateTime,
    pub difficulty: Option<u8>,
    pub importance: Option<u8>,
    pub reason: Option<String>,
    pub reward: Option<String>,
    pub punishment: Option<String>,
    /// Defaults to `active` on create; `None` keeps the current status on
    /// update.
    pub status_id: Option<i64>,
}

impl GoalDraft {
    pub fn new(name: impl Into<String>, target_quantity: Decimal, deadline: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            description: None,
            unit_code: None,
            target_quantity,
            current_progress: None,
            deadline,
            difficulty: None,
            importance: None,
            reason: None,
            reward: None,
            punishment: None,
            status_id: None,
        }
    }
}

/// Goal read model with its pacing projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub goal: Goal,
    /// Progress the goal should have reached by now under even pacing.
    pub ideal_progress: Decimal,
}

/// Request for decomposing a stored goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionRequest {
    pub goal_id: GoalId,
    pub frequency_id: i64,
    /// Proposed quantity per occurrence.
    pub quantity: Option<Decimal>,
}

/// Goal service facade over repository implementations.
pub struct GoalService<G: GoalRepository, T: TaskRepository, R: ReferenceRepository> {
    goals: G,
    tasks: T,
    reference: R,
}

impl<G, T, R> GoalService<G, T, R>
where
    G: GoalRepository,
    T: TaskRepository,
    R: ReferenceRepository,
{
    /// Creates a service using the provided repository implementations.
    pub fn new(goals: G, tasks: T, reference: R) -> Self {
        Self {
            goals,
            tasks,
            reference,
        }
    }

    /// Creates a goal from `draft` using the local clock.
    pub fn create_goal(&self, draft: &GoalDraft) -> ServiceResult<GoalRecord> {
        self.create_goal_at(draft, local_now())
    }

    /// Creates a goal from `draft` as of `now`.
    ///
    /// # Errors
    /// - `UnitNotFound` / `StatusNotFound` for unknown references.
    /// - `Validation` when the goal breaks a business rule.
    pub fn create_goal_at(&self, draft: &GoalDraft, now: NaiveDateTime) -> ServiceResult<GoalRecord> {
        let status = match draft.status_id {
            Some(id) => self.status_by_id(id)?,
            None => self
                .reference
                .find_status_by_name(GoalStatus::ACTIVE)?
                .ok_or_else(|| ServiceError::StatusNotFound {
                    key: GoalStatus::ACTIVE.to_string(),
                })?,
        };

        let mut goal = Goal::new(
            draft.name.trim(),
            draft.target_quantity,
            draft.deadline,
            status,
            now,
        );
        goal.current_progress = draft.current_progress.unwrap_or(Decimal::ZERO);
        if let Some(code) = draft.unit_code.as_deref() {
            goal.unit = Some(self.unit_by_code(code)?);
        }
        apply_draft_details(&mut goal, draft);

        goal.validate_for_write(now)?;
        self.goals.create_goal(&goal)?;
        info!(
            "event=goal_create module=service status=ok goal_id={}",
            goal.id
        );
        self.to_record(goal, now)
    }

    /// Updates a goal using the local clock.
    pub fn update_goal(&self, id: GoalId, draft: &GoalDraft) -> ServiceResult<GoalRecord> {
        self.update_goal_at(id, draft, local_now())
    }

    /// Replaces the editable fields of goal `id` with `draft` as of `now`.
    ///
    /// Setting the status to `completed` stamps `completed_at = now`; any
    /// other explicit status clears it.
    pub fn update_goal_at(
        &self,
        id: GoalId,
        draft: &GoalDraft,
        now: NaiveDateTime,
    ) -> ServiceResult<GoalRecord> {
        let mut goal = self.visible_goal(id)?;

        goal.name = draft.name.trim().to_string();
        goal.target_quantity = draft.target_quantity;
        goal.deadline = draft.deadline;
        if let Some(code) = draft.unit_code.as_deref() {
            goal.unit = Some(self.unit_by_code(code)?);
        }
        if let Some(progress) = draft.current_progress {
            goal.current_progress = progress;
        }
        apply_draft_details(&mut goal, draft);

        if let Some(status_id) = draft.status_id {
            let status = self.status_by_id(status_id)?;
            goal.completed_at = status.is_completed().then_some(now);
            goal.status = status;
        }
        goal.updated_at = Some(now);

        goal.validate_for_write(now)?;
        self.goals.update_goal(&goal)?;
        self.to_record(goal, now)
    }

    /// Gets one visible goal with its ideal progress.
    pub fn get_goal(&self, id: GoalId) -> ServiceResult<GoalRecord> {
        self.get_goal_at(id, local_now())
    }

    pub fn get_goal_at(&self, id: GoalId, now: NaiveDateTime) -> ServiceResult<GoalRecord> {
        let goal = self.visible_goal(id)?;
        self.to_record(goal, now)
    }

    /// Lists visible goals, newest first.
    pub fn list_goals(&self) -> ServiceResult<Vec<GoalRecord>> {
        self.list_goals_at(local_now())
    }

    pub fn list_goals_at(&self, now: NaiveDateTime) -> ServiceResult<Vec<GoalRecord>> {
        self.goals
            .list_goals(false)?
            .into_iter()
            .map(|goal| self.to_record(goal, now))
            .collect()
    }

    /// Soft-deletes goal `id`; deleting twice is a no-op.
    pub fn delete_goal(&self, id: GoalId) -> ServiceResult<()> {
        let goal = self
            .goals
            .get_goal(id, true)?
            .ok_or(ServiceError::GoalNotFound(id))?;
        if goal.is_deleted {
            return Ok(());
        }
        self.goals.soft_delete_goal(id)?;
        Ok(())
    }

    /// Decomposes a goal using the local clock.
    pub fn decompose_goal(&self, request: &DecompositionRequest) -> ServiceResult<Decomposition> {
        self.decompose_goal_at(request, local_now())
    }

    /// Decomposes the stored goal into a per-occurrence quota as of `now`.
    ///
    /// # Errors
    /// - `GoalNotFound` / `FrequencyNotFound` for unknown references.
    /// - `Plan` when the engine rejects the request (e.g. no occurrences left).
    pub fn decompose_goal_at(
        &self,
        request: &DecompositionRequest,
        now: NaiveDateTime,
    ) -> ServiceResult<Decomposition> {
        let started_at = Instant::now();
        let goal = self.visible_goal(request.goal_id)?;
        let frequency = self
            .reference
            .get_frequency(request.frequency_id)?
            .ok_or(ServiceError::FrequencyNotFound(request.frequency_id))?;

        match decompose(&goal, &frequency, request.quantity, now) {
            Ok(decomposition) => {
                info!(
                    "event=goal_decompose module=service status=ok goal_id={} frequency={} duration_ms={}",
                    goal.id,
                    frequency.name,
                    started_at.elapsed().as_millis()
                );
                Ok(decomposition)
            }
            Err(err) => {
                warn!(
                    "event=goal_decompose module=service status=error goal_id={} frequency={} duration_ms={} error={}",
                    goal.id,
                    frequency.name,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn visible_goal(&self, id: GoalId) -> ServiceResult<Goal> {
        self.goals
            .get_goal(id, false)?
            .ok_or(ServiceError::GoalNotFound(id))
    }

    fn status_by_id(&self, id: i64) -> ServiceResult<GoalStatus> {
        self.reference
            .get_status(id)?
            .ok_or_else(|| ServiceError::StatusNotFound { key: id.to_string() })
    }

    fn unit_by_code(&self, code: &str) -> ServiceResult<Unit> {
        self.reference
            .find_unit_by_code(code)?
            .ok_or_else(|| ServiceError::UnitNotFound(code.trim().to_string()))
    }

    fn to_record(&self, goal: Goal, now: NaiveDateTime) -> ServiceResult<GoalRecord> {
        let tasks = self.tasks.list_tasks(&TaskListQuery {
            goal_id: Some(goal.id),
            ..TaskListQuery::default()
        })?;
        // Newest first, so the tracking task is the oldest one.
        let tracking_frequency = tasks.last().map(|task| &task.frequency);
        let ideal_progress = ideal_progress(&goal, tracking_frequency, now)?;
        Ok(GoalRecord {
            goal,
            ideal_progress,
        })
    }
}

fn apply_draft_details(goal: &mut Goal, draft: &GoalDraft) {
    goal.description = draft.description.clone();
    goal.difficulty = draft.difficulty;
    goal.importance = draft.importance;
    goal.reason = draft.reason.clone();
    goal.reward = draft.reward.clone();
    goal.punishment = draft.punishment.clone();
}
