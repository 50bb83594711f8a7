use goalpace_core::db::migrations::latest_version;
use goalpace_core::db::{open_db, open_db_in_memory, DbError};
use goalpace_core::{RepoError, SqliteGoalRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "frequencies",
        "goal_statuses",
        "units",
        "goals",
        "tasks",
        "task_days",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reference_data_is_seeded_with_stable_ids() {
    let conn = open_db_in_memory().unwrap();

    let frequencies: Vec<(i64, String)> = conn
        .prepare("SELECT id, name FROM frequencies ORDER BY id;")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let names: Vec<&str> = frequencies.iter().map(|(_, name)| name.as_str()).collect();
    assert_eq!(names, ["one-time", "daily", "weekly", "monthly", "yearly"]);
    assert_eq!(frequencies[0].0, 1);

    let active_id: i64 = conn
        .query_row(
            "SELECT id FROM goal_statuses WHERE name = 'active';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(active_id, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goalpace.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let seeded: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM frequencies;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seeded, 5);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteGoalRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::SchemaNotReady { db_version: 0, .. })
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
