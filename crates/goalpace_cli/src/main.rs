//! CLI entry point.
//!
//! # Responsibility
//! - Open the configured goal/task store.
//! - Print today's ranked due tasks.
//!
//! # Configuration
//! - `GOALPACE_DB`: database file path; in-memory when unset.
//! - `GOALPACE_LOG_DIR`: absolute log directory; logging stays off when unset.
//! - `GOALPACE_LOG_LEVEL`: log level; defaults to the build-mode level.

use chrono::Local;
use goalpace_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory,
    SqliteGoalRepository, SqliteReferenceRepository, SqliteTaskRepository, TaskRecord,
    TaskService,
};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

const DB_ENV: &str = "GOALPACE_DB";
const LOG_DIR_ENV: &str = "GOALPACE_LOG_DIR";
const LOG_LEVEL_ENV: &str = "GOALPACE_LOG_LEVEL";

fn main() -> ExitCode {
    println!("goalpace_core version={}", core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let conn = match std::env::var(DB_ENV) {
        Ok(path) if !path.trim().is_empty() => open_db(path.trim())?,
        _ => open_db_in_memory()?,
    };
    let service = TaskService::new(
        SqliteTaskRepository::try_new(&conn)?,
        SqliteGoalRepository::try_new(&conn)?,
        SqliteReferenceRepository::try_new(&conn)?,
    );

    let today = Local::now().date_naive();
    let due = service.tasks_due_today(today, true)?;
    info!(
        "event=cli_run module=cli status=ok date={} count={}",
        today,
        due.len()
    );

    println!("due today ({today}): {}", due.len());
    for record in &due {
        println!("{}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &TaskRecord) -> String {
    let mut line = format!("{:>3}. {}", record.order, record.task.name);
    if record.is_urgent() {
        line.push_str(" [urgent]");
    }
    if let Some(goal) = record.goal_name.as_deref() {
        line.push_str(&format!(" (goal: {goal})"));
    }
    line
}
