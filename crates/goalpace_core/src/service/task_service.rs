//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete and completion entry points for tasks.
//! - Keep linked goal progress in step with task completion and progress.
//! - Serve ranked task lists, including the tasks due on a given day.
//!
//! # Invariants
//! - Every task change and its goal delta are written in one transaction.
//! - Every list returned here has passed through `rank_tasks`.
//! - Deleted tasks are invisible to every entry point.

use crate::engine::due::{select_due, CalendarContext};
use crate::engine::progress::{
    completion_transition_delta, plan_completion, plan_progress, plan_uncompletion,
    sync_completion, ProgressPlan,
};
use crate::engine::ranking::rank_tasks;
use crate::model::frequency::Frequency;
use crate::model::goal::{Goal, GoalId};
use crate::model::task::{Task, TaskId, TaskRecord};
use crate::repo::goal_repo::GoalRepository;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::local_now;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Caller input for creating or updating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    /// Linked goal; `None` unlinks on update.
    pub goal_id: Option<GoalId>,
    pub frequency_id: i64,
    /// `None` keeps the current quantity on update.
    pub quantity: Option<Decimal>,
    /// `None` keeps the current progress on update.
    pub progress: Option<Decimal>,
    /// `None` keeps the current overflow quantity on update.
    pub overflow_quantity: Option<Decimal>,
    pub urgent: bool,
    /// Days for the set matching the frequency (weekday, month day or year
    /// day).
    pub selected_days: Vec<u32>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, frequency_id: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            goal_id: None,
            frequency_id,
            quantity: None,
            progress: None,
            overflow_quantity: None,
            urgent: false,
            selected_days: Vec::new(),
        }
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<T: TaskRepository, G: GoalRepository, R: ReferenceRepository> {
    tasks: T,
    goals: G,
    reference: R,
}

impl<T, G, R> TaskService<T, G, R>
where
    T: TaskRepository,
    G: GoalRepository,
    R: ReferenceRepository,
{
    /// Creates a service using the provided repository implementations.
    pub fn new(tasks: T, goals: G, reference: R) -> Self {
        Self {
            tasks,
            goals,
            reference,
        }
    }

    /// Creates a task using the local clock.
    pub fn create_task(&self, draft: &TaskDraft) -> ServiceResult<TaskRecord> {
        self.create_task_at(draft, local_now())
    }

    /// Creates a task from `draft` as of `now`.
    ///
    /// Initial progress is only honored for tasks with a positive quantity;
    /// a task created already complete credits its goal immediately.
    ///
    /// # Errors
    /// - `FrequencyNotFound` / `GoalNotFound` for unknown references.
    /// - `Validation` when the task breaks a business rule.
    pub fn create_task_at(&self, draft: &TaskDraft, now: NaiveDateTime) -> ServiceResult<TaskRecord> {
        let frequency = self.frequency(draft.frequency_id)?;
        let goal = match draft.goal_id {
            Some(goal_id) => Some(self.linkable_goal(goal_id)?),
            None => None,
        };

        let mut task = Task::new(draft.name.trim(), frequency);
        task.description = draft.description.clone();
        task.goal_id = goal.as_ref().map(|goal| goal.id);
        task.assign_selected_days(draft.selected_days.iter().copied());
        if let Some(overflow) = draft.overflow_quantity {
            task.overflow_quantity = overflow;
        }
        task.quantity = draft.quantity;
        task.urgent = draft.urgent;
        task.created_at = Some(now);
        if let (Some(progress), Some(quantity)) = (draft.progress, draft.quantity) {
            if quantity > Decimal::ZERO {
                task.progress = Some(progress);
                sync_completion(&mut task, now);
            }
        }

        task.validate()?;
        let goal_delta = task
            .goal_id
            .zip(completion_transition_delta(false, &task));
        self.tasks.create_task_with_goal_delta(&task, goal_delta)?;

        info!("event=task_create module=service status=ok task_id={}", task.id);
        Ok(TaskRecord::new(task, goal.as_ref()))
    }

    /// Updates a task using the local clock.
    pub fn update_task(&self, id: TaskId, draft: &TaskDraft) -> ServiceResult<TaskRecord> {
        self.update_task_at(id, draft, local_now())
    }

    /// Replaces the editable fields of task `id` with `draft` as of `now`.
    ///
    /// When the edit flips the completion state of a quantity-bearing task,
    /// the linked goal gains or loses that quantity.
    pub fn update_task_at(
        &self,
        id: TaskId,
        draft: &TaskDraft,
        now: NaiveDateTime,
    ) -> ServiceResult<TaskRecord> {
        let mut task = self.visible_task(id)?;
        let frequency = self.frequency(draft.frequency_id)?;
        let goal = match draft.goal_id {
            Some(goal_id) => Some(self.linkable_goal(goal_id)?),
            None => None,
        };

        task.name = draft.name.trim().to_string();
        task.description = draft.description.clone();
        task.frequency = frequency;
        task.assign_selected_days(draft.selected_days.iter().copied());
        task.goal_id = goal.as_ref().map(|goal| goal.id);
        if let Some(overflow) = draft.overflow_quantity {
            task.overflow_quantity = overflow;
        }
        if let Some(quantity) = draft.quantity {
            task.quantity = Some(quantity);
        }

        let was_completed = task.is_completed();
        if let Some(progress) = draft.progress {
            task.progress = Some(progress);
            sync_completion(&mut task, now);
        }
        task.urgent = draft.urgent;
        task.updated_at = Some(now);

        let delta = completion_transition_delta(was_completed, &task);
        self.save(&task, delta)?;
        Ok(TaskRecord::new(task, goal.as_ref()))
    }

    /// Gets one visible task with its goal projection.
    pub fn get_task(&self, id: TaskId) -> ServiceResult<TaskRecord> {
        let task = self.visible_task(id)?;
        let goal = self.task_goal(&task)?;
        Ok(TaskRecord::new(task, goal.as_ref()))
    }

    /// Soft-deletes task `id`.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.visible_task(id)?;
        self.tasks.soft_delete_task(id)?;
        Ok(())
    }

    /// Completes a task using the local clock.
    pub fn complete_task(&self, id: TaskId) -> ServiceResult<TaskRecord> {
        self.complete_task_at(id, local_now())
    }

    /// Marks task `id` complete at `now` and credits its goal.
    pub fn complete_task_at(&self, id: TaskId, now: NaiveDateTime) -> ServiceResult<TaskRecord> {
        let task = self.visible_task(id)?;
        let mut plan = plan_completion(&task, now);
        plan.task.updated_at = Some(now);
        self.apply_plan("task_complete", plan)
    }

    /// Reverts completion using the local clock.
    pub fn uncomplete_task(&self, id: TaskId) -> ServiceResult<TaskRecord> {
        self.uncomplete_task_at(id, local_now())
    }

    /// Clears completion of task `id` and debits its goal, clamped at zero.
    pub fn uncomplete_task_at(&self, id: TaskId, now: NaiveDateTime) -> ServiceResult<TaskRecord> {
        let task = self.visible_task(id)?;
        let mut plan = plan_uncompletion(&task);
        plan.task.updated_at = Some(now);
        self.apply_plan("task_uncomplete", plan)
    }

    /// Records progress using the local clock.
    pub fn add_progress(&self, id: TaskId, quantity: Decimal) -> ServiceResult<TaskRecord> {
        self.add_progress_at(id, quantity, local_now())
    }

    /// Adds `quantity` (possibly negative) to task `id` and its goal.
    ///
    /// # Errors
    /// - `TaskNotLinkedToGoal` when the task has no goal.
    /// - `GoalWithoutUnit` when the goal is not measured in a unit.
    /// - `Plan(InvalidQuantity)` when `quantity` is zero.
    pub fn add_progress_at(
        &self,
        id: TaskId,
        quantity: Decimal,
        now: NaiveDateTime,
    ) -> ServiceResult<TaskRecord> {
        let task = self.visible_task(id)?;
        let goal_id = task.goal_id.ok_or(ServiceError::TaskNotLinkedToGoal(id))?;
        let goal = self
            .goals
            .get_goal(goal_id, true)?
            .ok_or(ServiceError::GoalNotFound(goal_id))?;
        if goal.unit.is_none() {
            return Err(ServiceError::GoalWithoutUnit(goal_id));
        }

        let mut plan = plan_progress(&task, quantity, now)?;
        plan.task.updated_at = Some(now);
        self.apply_plan("task_progress", plan)
    }

    /// Sets the urgent flag of task `id`.
    pub fn set_urgent(&self, id: TaskId, urgent: bool) -> ServiceResult<TaskRecord> {
        let mut task = self.visible_task(id)?;
        task.urgent = urgent;
        task.updated_at = Some(local_now());
        self.save(&task, None)?;
        let goal = self.task_goal(&task)?;
        Ok(TaskRecord::new(task, goal.as_ref()))
    }

    /// Lists every visible task, ranked.
    pub fn list_tasks(&self) -> ServiceResult<Vec<TaskRecord>> {
        self.list_ranked(&TaskListQuery::default())
    }

    /// Lists the tasks linked to goal `goal_id`, ranked.
    pub fn list_tasks_by_goal(&self, goal_id: GoalId) -> ServiceResult<Vec<TaskRecord>> {
        self.goals
            .get_goal(goal_id, true)?
            .ok_or(ServiceError::GoalNotFound(goal_id))?;
        self.list_ranked(&TaskListQuery {
            goal_id: Some(goal_id),
            ..TaskListQuery::default()
        })
    }

    /// Lists recurring tasks, ranked.
    pub fn list_habits(&self) -> ServiceResult<Vec<TaskRecord>> {
        self.list_ranked(&TaskListQuery {
            habits_only: true,
            ..TaskListQuery::default()
        })
    }

    /// Lists one-time tasks, ranked.
    pub fn list_one_time_tasks(&self) -> ServiceResult<Vec<TaskRecord>> {
        self.list_ranked(&TaskListQuery {
            one_time_only: true,
            ..TaskListQuery::default()
        })
    }

    pub fn list_tasks_by_frequency(&self, frequency_id: i64) -> ServiceResult<Vec<TaskRecord>> {
        self.list_ranked(&TaskListQuery {
            frequency_id: Some(frequency_id),
            ..TaskListQuery::default()
        })
    }

    /// Lists tasks whose name contains `name`, case-insensitively, ranked.
    pub fn search_tasks(&self, name: &str) -> ServiceResult<Vec<TaskRecord>> {
        self.list_ranked(&TaskListQuery {
            name_contains: Some(name.trim().to_string()),
            ..TaskListQuery::default()
        })
    }

    /// Lists the tasks due on `date`, ranked.
    ///
    /// One-time tasks are included only when `include_one_time` is set.
    pub fn tasks_due_today(
        &self,
        date: NaiveDate,
        include_one_time: bool,
    ) -> ServiceResult<Vec<TaskRecord>> {
        let started_at = Instant::now();
        let tasks = self.tasks.list_tasks(&TaskListQuery::default())?;
        let ctx = CalendarContext::for_date(date, include_one_time);
        let due = select_due(&tasks, &ctx)?
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let records = self.ranked_records(due)?;

        info!(
            "event=tasks_due_today module=service status=ok date={} include_one_time={} count={} duration_ms={}",
            date,
            include_one_time,
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    fn apply_plan(&self, event: &'static str, plan: ProgressPlan) -> ServiceResult<TaskRecord> {
        let started_at = Instant::now();
        let ProgressPlan { task, goal_delta } = plan;
        let goal_progress = self.save(&task, goal_delta)?;

        info!(
            "event={event} module=service status=ok task_id={} goal_delta={} goal_progress={} duration_ms={}",
            task.id,
            display_or_none(goal_delta),
            display_or_none(goal_progress),
            started_at.elapsed().as_millis()
        );

        let goal = self.task_goal(&task)?;
        Ok(TaskRecord::new(task, goal.as_ref()))
    }

    fn save(&self, task: &Task, delta: Option<Decimal>) -> ServiceResult<Option<Decimal>> {
        let goal_delta = task.goal_id.zip(delta);
        Ok(self.tasks.save_task_with_goal_delta(task, goal_delta)?)
    }

    fn list_ranked(&self, query: &TaskListQuery) -> ServiceResult<Vec<TaskRecord>> {
        let tasks = self.tasks.list_tasks(query)?;
        self.ranked_records(tasks)
    }

    fn ranked_records(&self, tasks: Vec<Task>) -> ServiceResult<Vec<TaskRecord>> {
        let mut goals: HashMap<GoalId, Option<Goal>> = HashMap::new();
        let mut records = Vec::with_capacity(tasks.len());
        for task in tasks {
            let goal = match task.goal_id {
                Some(goal_id) => {
                    if !goals.contains_key(&goal_id) {
                        goals.insert(goal_id, self.goals.get_goal(goal_id, true)?);
                    }
                    goals.get(&goal_id).and_then(Option::as_ref)
                }
                None => None,
            };
            records.push(TaskRecord::new(task, goal));
        }
        Ok(rank_tasks(records))
    }

    fn visible_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.tasks
            .get_task(id, false)?
            .ok_or(ServiceError::TaskNotFound(id))
    }

    fn frequency(&self, id: i64) -> ServiceResult<Frequency> {
        self.reference
            .get_frequency(id)?
            .ok_or(ServiceError::FrequencyNotFound(id))
    }

    fn linkable_goal(&self, id: GoalId) -> ServiceResult<Goal> {
        self.goals
            .get_goal(id, false)?
            .ok_or(ServiceError::GoalNotFound(id))
    }

    fn task_goal(&self, task: &Task) -> ServiceResult<Option<Goal>> {
        match task.goal_id {
            Some(goal_id) => Ok(self.goals.get_goal(goal_id, true)?),
            None => Ok(None),
        }
    }
}

fn display_or_none(value: Option<Decimal>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
}
