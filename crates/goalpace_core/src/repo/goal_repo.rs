//! Goal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `goals` table.
//! - Resolve status and unit references into goal snapshots on read.
//!
//! # Invariants
//! - Write paths call `Goal::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Deleted goals are hidden unless explicitly requested.

use crate::db::ensure_schema_ready;
use crate::model::frequency::{GoalStatus, Unit};
use crate::model::goal::{Goal, GoalId};
use crate::repo::codec::{
    bool_to_int, datetime_to_db, decimal_to_db, parse_bool, parse_datetime, parse_decimal,
    parse_optional_datetime, parse_rating, parse_uuid,
};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const GOAL_SELECT_SQL: &str = "SELECT
    g.uuid AS uuid,
    g.name AS name,
    g.description AS description,
    g.target_quantity AS target_quantity,
    g.current_progress AS current_progress,
    g.deadline AS deadline,
    g.difficulty AS difficulty,
    g.importance AS importance,
    g.reason AS reason,
    g.reward AS reward,
    g.punishment AS punishment,
    g.created_at AS created_at,
    g.updated_at AS updated_at,
    g.completed_at AS completed_at,
    g.is_deleted AS is_deleted,
    s.id AS status_id,
    s.name AS status_name,
    u.id AS unit_id,
    u.code AS unit_code,
    u.name AS unit_name
FROM goals g
JOIN goal_statuses s ON s.id = g.status_id
LEFT JOIN units u ON u.id = g.unit_id";

/// Repository interface for goal CRUD operations.
pub trait GoalRepository {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId>;
    fn update_goal(&self, goal: &Goal) -> RepoResult<()>;
    fn get_goal(&self, id: GoalId, include_deleted: bool) -> RepoResult<Option<Goal>>;
    fn list_goals(&self, include_deleted: bool) -> RepoResult<Vec<Goal>>;
    fn soft_delete_goal(&self, id: GoalId) -> RepoResult<()>;
}

/// SQLite-backed goal repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId> {
        goal.validate()?;

        self.conn.execute(
            "INSERT INTO goals (
                uuid,
                name,
                description,
                unit_id,
                target_quantity,
                current_progress,
                deadline,
                difficulty,
                importance,
                reason,
                reward,
                punishment,
                status_id,
                created_at,
                updated_at,
                completed_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
            params![
                goal.id.to_string(),
                goal.name.as_str(),
                goal.description.as_deref(),
                goal.unit.as_ref().map(|unit| unit.id),
                decimal_to_db(goal.target_quantity),
                decimal_to_db(goal.current_progress),
                datetime_to_db(goal.deadline),
                goal.difficulty,
                goal.importance,
                goal.reason.as_deref(),
                goal.reward.as_deref(),
                goal.punishment.as_deref(),
                goal.status.id,
                datetime_to_db(goal.created_at),
                goal.updated_at.map(datetime_to_db),
                goal.completed_at.map(datetime_to_db),
                bool_to_int(goal.is_deleted),
            ],
        )?;

        Ok(goal.id)
    }

    fn update_goal(&self, goal: &Goal) -> RepoResult<()> {
        goal.validate()?;

        let changed = self.conn.execute(
            "UPDATE goals
             SET
                name = ?1,
                description = ?2,
                unit_id = ?3,
                target_quantity = ?4,
                current_progress = ?5,
                deadline = ?6,
                difficulty = ?7,
                importance = ?8,
                reason = ?9,
                reward = ?10,
                punishment = ?11,
                status_id = ?12,
                updated_at = ?13,
                completed_at = ?14,
                is_deleted = ?15
             WHERE uuid = ?16;",
            params![
                goal.name.as_str(),
                goal.description.as_deref(),
                goal.unit.as_ref().map(|unit| unit.id),
                decimal_to_db(goal.target_quantity),
                decimal_to_db(goal.current_progress),
                datetime_to_db(goal.deadline),
                goal.difficulty,
                goal.importance,
                goal.reason.as_deref(),
                goal.reward.as_deref(),
                goal.punishment.as_deref(),
                goal.status.id,
                goal.updated_at.map(datetime_to_db),
                goal.completed_at.map(datetime_to_db),
                bool_to_int(goal.is_deleted),
                goal.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::GoalNotFound(goal.id));
        }

        Ok(())
    }

    fn get_goal(&self, id: GoalId, include_deleted: bool) -> RepoResult<Option<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE g.uuid = ?1
               AND (?2 = 1 OR g.is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }

        Ok(None)
    }

    fn list_goals(&self, include_deleted: bool) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE (?1 = 1 OR g.is_deleted = 0)
             ORDER BY g.created_at DESC, g.uuid ASC;"
        ))?;

        let mut rows = stmt.query(params![bool_to_int(include_deleted)])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }

        Ok(goals)
    }

    fn soft_delete_goal(&self, id: GoalId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE goals SET is_deleted = 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::GoalNotFound(id));
        }

        Ok(())
    }
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let uuid_text: String = row.get("uuid")?;
    let target_text: String = row.get("target_quantity")?;
    let progress_text: String = row.get("current_progress")?;

    let unit = match row.get::<_, Option<i64>>("unit_id")? {
        Some(id) => Some(Unit {
            id,
            code: row.get("unit_code")?,
            name: row.get("unit_name")?,
        }),
        None => None,
    };

    let goal = Goal {
        id: parse_uuid("goals.uuid", &uuid_text)?,
        name: row.get("name")?,
        description: row.get("description")?,
        unit,
        target_quantity: parse_decimal("goals.target_quantity", &target_text)?,
        current_progress: parse_decimal("goals.current_progress", &progress_text)?,
        deadline: parse_datetime("goals.deadline", row.get("deadline")?)?,
        difficulty: parse_rating("goals.difficulty", row.get("difficulty")?)?,
        importance: parse_rating("goals.importance", row.get("importance")?)?,
        reason: row.get("reason")?,
        reward: row.get("reward")?,
        punishment: row.get("punishment")?,
        status: GoalStatus::new(row.get("status_id")?, row.get::<_, String>("status_name")?),
        created_at: parse_datetime("goals.created_at", row.get("created_at")?)?,
        updated_at: parse_optional_datetime("goals.updated_at", row.get("updated_at")?)?,
        completed_at: parse_optional_datetime("goals.completed_at", row.get("completed_at")?)?,
        is_deleted: parse_bool("goals.is_deleted", row.get("is_deleted")?)?,
    };
    goal.validate()?;
    Ok(goal)
}
