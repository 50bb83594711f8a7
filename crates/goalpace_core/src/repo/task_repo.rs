//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered list APIs over `tasks` and `task_days`.
//! - Apply a task change and its goal-progress delta atomically.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - A task row and its recurrence days are always written together.
//! - Goal progress written through this repository never drops below zero.

use crate::db::ensure_schema_ready;
use crate::engine::progress::apply_goal_delta;
use crate::model::frequency::{Frequency, FrequencyKind};
use crate::model::goal::GoalId;
use crate::model::task::{Task, TaskId};
use crate::repo::codec::{
    bool_to_int, datetime_to_db, decimal_to_db, parse_bool, parse_decimal,
    parse_optional_datetime, parse_optional_decimal, parse_uuid,
};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const TASK_SELECT_SQL: &str = "SELECT
    t.uuid AS uuid,
    t.name AS name,
    t.description AS description,
    t.goal_id AS goal_id,
    t.quantity AS quantity,
    t.progress AS progress,
    t.overflow_quantity AS overflow_quantity,
    t.completed_at AS completed_at,
    t.urgent AS urgent,
    t.created_at AS created_at,
    t.updated_at AS updated_at,
    t.is_deleted AS is_deleted,
    f.id AS frequency_id,
    f.name AS frequency_name
FROM tasks t
JOIN frequencies f ON f.id = t.frequency_id";

const DAY_KIND_WEEK: &str = "week";
const DAY_KIND_MONTH: &str = "month";
const DAY_KIND_YEAR: &str = "year";

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Only tasks linked to this goal.
    pub goal_id: Option<GoalId>,
    /// Only tasks with this frequency id.
    pub frequency_id: Option<i64>,
    /// Only one-time tasks.
    pub one_time_only: bool,
    /// Only recurring tasks (anything but one-time).
    pub habits_only: bool,
    /// Case-insensitive substring match on task name.
    pub name_contains: Option<String>,
    pub include_deleted: bool,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId, include_deleted: bool) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn soft_delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Updates `task` and applies `goal_delta` to the goal's progress in one
    /// transaction.
    ///
    /// Returns the goal's new progress when a delta was applied.
    fn save_task_with_goal_delta(
        &self,
        task: &Task,
        goal_delta: Option<(GoalId, Decimal)>,
    ) -> RepoResult<Option<Decimal>>;
    /// Inserts `task` and applies `goal_delta` in one transaction.
    fn create_task_with_goal_delta(
        &self,
        task: &Task,
        goal_delta: Option<(GoalId, Decimal)>,
    ) -> RepoResult<Option<Decimal>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        insert_task_row(&tx, task)?;
        tx.commit()?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        update_task_row(&tx, task)?;
        tx.commit()?;
        Ok(())
    }

    fn get_task(&self, id: TaskId, include_deleted: bool) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE t.uuid = ?1
               AND (?2 = 1 OR t.is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            load_task_days(self.conn, &mut task)?;
            return Ok(Some(task));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND t.is_deleted = 0");
        }

        if let Some(goal_id) = query.goal_id {
            sql.push_str(" AND t.goal_id = ?");
            bind_values.push(Value::Text(goal_id.to_string()));
        }

        if let Some(frequency_id) = query.frequency_id {
            sql.push_str(" AND t.frequency_id = ?");
            bind_values.push(Value::Integer(frequency_id));
        }

        if query.one_time_only {
            sql.push_str(" AND f.name = ? COLLATE NOCASE");
            bind_values.push(Value::Text(FrequencyKind::OneTime.as_str().to_string()));
        }

        if query.habits_only {
            sql.push_str(" AND f.name <> ? COLLATE NOCASE");
            bind_values.push(Value::Text(FrequencyKind::OneTime.as_str().to_string()));
        }

        if let Some(needle) = query.name_contains.as_deref() {
            sql.push_str(" AND instr(lower(t.name), lower(?)) > 0");
            bind_values.push(Value::Text(needle.to_string()));
        }

        sql.push_str(" ORDER BY t.created_at DESC, t.uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        for task in &mut tasks {
            load_task_days(self.conn, task)?;
        }

        Ok(tasks)
    }

    fn soft_delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_deleted = 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn save_task_with_goal_delta(
        &self,
        task: &Task,
        goal_delta: Option<(GoalId, Decimal)>,
    ) -> RepoResult<Option<Decimal>> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        update_task_row(&tx, task)?;

        let new_progress = goal_delta
            .map(|(goal_id, delta)| apply_goal_delta_row(&tx, goal_id, delta))
            .transpose()?;
        tx.commit()?;
        Ok(new_progress)
    }

    fn create_task_with_goal_delta(
        &self,
        task: &Task,
        goal_delta: Option<(GoalId, Decimal)>,
    ) -> RepoResult<Option<Decimal>> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        insert_task_row(&tx, task)?;
        let new_progress = goal_delta
            .map(|(goal_id, delta)| apply_goal_delta_row(&tx, goal_id, delta))
            .transpose()?;

        tx.commit()?;
        Ok(new_progress)
    }
}

fn insert_task_row(conn: &Connection, task: &Task) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO tasks (
            uuid,
            name,
            description,
            goal_id,
            frequency_id,
            quantity,
            progress,
            overflow_quantity,
            completed_at,
            urgent,
            created_at,
            updated_at,
            is_deleted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
        params![
            task.id.to_string(),
            task.name.as_str(),
            task.description.as_deref(),
            task.goal_id.map(|id| id.to_string()),
            task.frequency.id,
            task.quantity.map(decimal_to_db),
            task.progress.map(decimal_to_db),
            decimal_to_db(task.overflow_quantity),
            task.completed_at.map(datetime_to_db),
            bool_to_int(task.urgent),
            task.created_at.map(datetime_to_db),
            task.updated_at.map(datetime_to_db),
            bool_to_int(task.is_deleted),
        ],
    )?;
    replace_task_days(conn, task)
}

fn apply_goal_delta_row(conn: &Connection, goal_id: GoalId, delta: Decimal) -> RepoResult<Decimal> {
    let current: String = conn
        .query_row(
            "SELECT current_progress FROM goals WHERE uuid = ?1;",
            [goal_id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(RepoError::GoalNotFound(goal_id))?;
    let current = parse_decimal("goals.current_progress", &current)?;
    let next = apply_goal_delta(current, delta);
    conn.execute(
        "UPDATE goals SET current_progress = ?1 WHERE uuid = ?2;",
        params![decimal_to_db(next), goal_id.to_string()],
    )?;
    Ok(next)
}

fn update_task_row(conn: &Connection, task: &Task) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE tasks
         SET
            name = ?1,
            description = ?2,
            goal_id = ?3,
            frequency_id = ?4,
            quantity = ?5,
            progress = ?6,
            overflow_quantity = ?7,
            completed_at = ?8,
            urgent = ?9,
            updated_at = ?10,
            is_deleted = ?11
         WHERE uuid = ?12;",
        params![
            task.name.as_str(),
            task.description.as_deref(),
            task.goal_id.map(|id| id.to_string()),
            task.frequency.id,
            task.quantity.map(decimal_to_db),
            task.progress.map(decimal_to_db),
            decimal_to_db(task.overflow_quantity),
            task.completed_at.map(datetime_to_db),
            bool_to_int(task.urgent),
            task.updated_at.map(datetime_to_db),
            bool_to_int(task.is_deleted),
            task.id.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::TaskNotFound(task.id));
    }

    replace_task_days(conn, task)
}

fn replace_task_days(conn: &Connection, task: &Task) -> RepoResult<()> {
    let uuid = task.id.to_string();
    conn.execute("DELETE FROM task_days WHERE task_uuid = ?1;", [uuid.as_str()])?;

    let mut insert = conn.prepare_cached(
        "INSERT INTO task_days (task_uuid, kind, day) VALUES (?1, ?2, ?3);",
    )?;
    let sets = [
        (DAY_KIND_WEEK, &task.week_days),
        (DAY_KIND_MONTH, &task.month_days),
        (DAY_KIND_YEAR, &task.year_days),
    ];
    for (kind, days) in sets {
        for day in days {
            insert.execute(params![uuid.as_str(), kind, day])?;
        }
    }

    Ok(())
}

fn load_task_days(conn: &Connection, task: &mut Task) -> RepoResult<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT kind, day FROM task_days WHERE task_uuid = ?1 ORDER BY kind ASC, day ASC;",
    )?;
    let mut rows = stmt.query([task.id.to_string()])?;

    task.week_days.clear();
    task.month_days.clear();
    task.year_days.clear();
    while let Some(row) = rows.next()? {
        let kind: String = row.get(0)?;
        let day: u32 = row.get(1)?;
        let target = match kind.as_str() {
            DAY_KIND_WEEK => &mut task.week_days,
            DAY_KIND_MONTH => &mut task.month_days,
            DAY_KIND_YEAR => &mut task.year_days,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid day kind `{other}` in task_days.kind"
                )));
            }
        };
        target.insert(day);
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let goal_id = match row.get::<_, Option<String>>("goal_id")? {
        Some(text) => Some(parse_uuid("tasks.goal_id", &text)?),
        None => None,
    };
    let overflow_text: String = row.get("overflow_quantity")?;

    let mut task = Task::new(
        row.get::<_, String>("name")?,
        Frequency::new(row.get("frequency_id")?, row.get::<_, String>("frequency_name")?),
    );
    task.id = parse_uuid("tasks.uuid", &uuid_text)?;
    task.description = row.get("description")?;
    task.goal_id = goal_id;
    task.quantity = parse_optional_decimal("tasks.quantity", row.get("quantity")?)?;
    task.progress = parse_optional_decimal("tasks.progress", row.get("progress")?)?;
    task.overflow_quantity = parse_decimal("tasks.overflow_quantity", &overflow_text)?;
    task.completed_at = parse_optional_datetime("tasks.completed_at", row.get("completed_at")?)?;
    task.urgent = parse_bool("tasks.urgent", row.get("urgent")?)?;
    task.created_at = parse_optional_datetime("tasks.created_at", row.get("created_at")?)?;
    task.updated_at = parse_optional_datetime("tasks.updated_at", row.get("updated_at")?)?;
    task.is_deleted = parse_bool("tasks.is_deleted", row.get("is_deleted")?)?;
    Ok(task)
}
