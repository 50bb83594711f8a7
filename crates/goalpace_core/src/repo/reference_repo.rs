//! Read-only access to seeded reference data.
//!
//! # Responsibility
//! - Resolve frequencies, goal statuses and units by id, name or code.
//!
//! # Invariants
//! - Reference rows are seeded by migrations and never written here.
//! - Name/code lookups are case-insensitive.

use crate::db::ensure_schema_ready;
use crate::model::frequency::{Frequency, GoalStatus, Unit};
use crate::repo::error::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for reference data lookups.
pub trait ReferenceRepository {
    fn list_frequencies(&self) -> RepoResult<Vec<Frequency>>;
    fn get_frequency(&self, id: i64) -> RepoResult<Option<Frequency>>;
    fn get_status(&self, id: i64) -> RepoResult<Option<GoalStatus>>;
    fn find_status_by_name(&self, name: &str) -> RepoResult<Option<GoalStatus>>;
    fn list_units(&self) -> RepoResult<Vec<Unit>>;
    fn find_unit_by_code(&self, code: &str) -> RepoResult<Option<Unit>>;
}

/// SQLite-backed reference data repository.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn list_frequencies(&self) -> RepoResult<Vec<Frequency>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM frequencies ORDER BY id ASC;")?;
        let rows = stmt.query_map([], |row| Ok(Frequency::new(row.get(0)?, row.get::<_, String>(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_frequency(&self, id: i64) -> RepoResult<Option<Frequency>> {
        let frequency = self
            .conn
            .query_row(
                "SELECT id, name FROM frequencies WHERE id = ?1;",
                params![id],
                |row| Ok(Frequency::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(frequency)
    }

    fn get_status(&self, id: i64) -> RepoResult<Option<GoalStatus>> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name FROM goal_statuses WHERE id = ?1;",
                params![id],
                |row| Ok(GoalStatus::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(status)
    }

    fn find_status_by_name(&self, name: &str) -> RepoResult<Option<GoalStatus>> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name FROM goal_statuses WHERE name = ?1 COLLATE NOCASE;",
                params![name.trim()],
                |row| Ok(GoalStatus::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(status)
    }

    fn list_units(&self) -> RepoResult<Vec<Unit>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, name FROM units ORDER BY code ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok(Unit {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find_unit_by_code(&self, code: &str) -> RepoResult<Option<Unit>> {
        let unit = self
            .conn
            .query_row(
                "SELECT id, code, name FROM units WHERE code = ?1 COLLATE NOCASE;",
                params![code.trim()],
                |row| {
                    Ok(Unit {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(unit)
    }
}
