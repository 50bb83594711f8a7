use chrono::{Duration, NaiveDate, NaiveDateTime};
use goalpace_core::db::open_db_in_memory;
use goalpace_core::{
    DecompositionRequest, GoalDraft, GoalService, GoalValidationError, PlanError, ServiceError,
    SqliteGoalRepository, SqliteReferenceRepository, SqliteTaskRepository, TaskDraft, TaskService,
    ValidationError,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

const DAILY: i64 = 2;
const WEEKLY: i64 = 3;
const COMPLETED_STATUS: i64 = 2;
const PAUSED_STATUS: i64 = 3;

type Goals<'conn> = GoalService<
    SqliteGoalRepository<'conn>,
    SqliteTaskRepository<'conn>,
    SqliteReferenceRepository<'conn>,
>;
type Tasks<'conn> = TaskService<
    SqliteTaskRepository<'conn>,
    SqliteGoalRepository<'conn>,
    SqliteReferenceRepository<'conn>,
>;

fn goal_service(conn: &Connection) -> Goals<'_> {
    GoalService::new(
        SqliteGoalRepository::try_new(conn).unwrap(),
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteReferenceRepository::try_new(conn).unwrap(),
    )
}

fn task_service(conn: &Connection) -> Tasks<'_> {
    TaskService::new(
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteGoalRepository::try_new(conn).unwrap(),
        SqliteReferenceRepository::try_new(conn).unwrap(),
    )
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn draft(target: Decimal, days_left: i64) -> GoalDraft {
    GoalDraft::new("Read 100 pages", target, now() + Duration::days(days_left))
}

#[test]
fn create_goal_defaults_to_active_status() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);

    let mut input = draft(dec!(100), 10);
    input.unit_code = Some("Pages".to_string());
    input.importance = Some(3);
    let record = service.create_goal_at(&input, now()).unwrap();

    assert!(record.goal.status.is_active());
    assert_eq!(record.goal.current_progress, Decimal::ZERO);
    assert_eq!(record.goal.created_at, now());
    assert_eq!(record.goal.unit.as_ref().unwrap().code, "pages");
    assert_eq!(record.ideal_progress, Decimal::ZERO);

    let loaded = service.get_goal_at(record.goal.id, now()).unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn create_goal_rejects_unknown_references_and_past_deadline() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);

    let mut unknown_unit = draft(dec!(10), 5);
    unknown_unit.unit_code = Some("furlongs".to_string());
    assert!(matches!(
        service.create_goal_at(&unknown_unit, now()).unwrap_err(),
        ServiceError::UnitNotFound(code) if code == "furlongs"
    ));

    let mut unknown_status = draft(dec!(10), 5);
    unknown_status.status_id = Some(99);
    assert!(matches!(
        service.create_goal_at(&unknown_status, now()).unwrap_err(),
        ServiceError::StatusNotFound { key } if key == "99"
    ));

    assert!(matches!(
        service.create_goal_at(&draft(dec!(10), 0), now()).unwrap_err(),
        ServiceError::Validation(ValidationError::Goal(
            GoalValidationError::DeadlineNotInFuture { .. }
        ))
    ));
    assert!(service.list_goals_at(now()).unwrap().is_empty());
}

#[test]
fn status_change_controls_completion_stamp() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(50), 30), now()).unwrap().goal.id;

    let later = now() + Duration::days(2);
    let mut completed = draft(dec!(50), 30);
    completed.status_id = Some(COMPLETED_STATUS);
    let record = service.update_goal_at(id, &completed, later).unwrap();
    assert!(record.goal.status.is_completed());
    assert_eq!(record.goal.completed_at, Some(later));
    assert_eq!(record.goal.updated_at, Some(later));

    let mut paused = draft(dec!(50), 30);
    paused.status_id = Some(PAUSED_STATUS);
    let record = service.update_goal_at(id, &paused, later).unwrap();
    assert_eq!(record.goal.status.name, "paused");
    assert_eq!(record.goal.completed_at, None);
}

#[test]
fn update_keeps_progress_and_unit_when_not_supplied() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);

    let mut input = draft(dec!(40), 20);
    input.unit_code = Some("km".to_string());
    input.current_progress = Some(dec!(7));
    let id = service.create_goal_at(&input, now()).unwrap().goal.id;

    let mut edit = draft(dec!(45), 25);
    edit.name = "Run 45 km".to_string();
    let record = service.update_goal_at(id, &edit, now()).unwrap();

    assert_eq!(record.goal.name, "Run 45 km");
    assert_eq!(record.goal.target_quantity, dec!(45));
    assert_eq!(record.goal.current_progress, dec!(7));
    assert_eq!(record.goal.unit.unwrap().code, "km");
}

#[test]
fn delete_goal_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(5), 3), now()).unwrap().goal.id;

    service.delete_goal(id).unwrap();
    service.delete_goal(id).unwrap();

    assert!(matches!(
        service.get_goal_at(id, now()).unwrap_err(),
        ServiceError::GoalNotFound(found) if found == id
    ));
    assert!(matches!(
        service.delete_goal(Uuid::new_v4()).unwrap_err(),
        ServiceError::GoalNotFound(_)
    ));
}

#[test]
fn ideal_progress_follows_oldest_linked_task() {
    let conn = open_db_in_memory().unwrap();
    let goals = goal_service(&conn);
    let tasks = task_service(&conn);

    let id = goals.create_goal_at(&draft(dec!(300), 30), now()).unwrap().goal.id;
    let mut daily = TaskDraft::new("read", DAILY);
    daily.goal_id = Some(id);
    tasks.create_task_at(&daily, now()).unwrap();
    let mut weekly = TaskDraft::new("library visit", WEEKLY);
    weekly.goal_id = Some(id);
    weekly.selected_days = vec![6];
    tasks
        .create_task_at(&weekly, now() + Duration::hours(1))
        .unwrap();

    let record = goals.get_goal_at(id, now() + Duration::days(10)).unwrap();
    assert_eq!(record.ideal_progress, dec!(100));

    let past_deadline = goals.get_goal_at(id, now() + Duration::days(90)).unwrap();
    assert_eq!(past_deadline.ideal_progress, dec!(300));
}

#[test]
fn decompose_goal_evenly_splits_remaining_target() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(100), 10), now()).unwrap().goal.id;

    let result = service
        .decompose_goal_at(
            &DecompositionRequest {
                goal_id: id,
                frequency_id: DAILY,
                quantity: Some(dec!(10)),
            },
            now(),
        )
        .unwrap();

    assert_eq!(result.required_quantity, dec!(10));
    assert_eq!(result.feasible, Some(true));
    assert_eq!(result.shortfall, None);
    let eleventh = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    assert_eq!(
        result.suggested_deadline,
        Some(eleventh.and_hms_opt(0, 0, 0).unwrap())
    );
}

#[test]
fn decompose_goal_reports_shortfall_for_small_proposal() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(100), 5), now()).unwrap().goal.id;

    let result = service
        .decompose_goal_at(
            &DecompositionRequest {
                goal_id: id,
                frequency_id: DAILY,
                quantity: Some(dec!(10)),
            },
            now(),
        )
        .unwrap();

    assert_eq!(result.required_quantity, dec!(20));
    assert_eq!(result.feasible, Some(false));
    assert_eq!(result.shortfall, Some(dec!(50)));
}

#[test]
fn decompose_goal_surfaces_engine_and_lookup_errors() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(100), 3), now()).unwrap().goal.id;

    let weekly = DecompositionRequest {
        goal_id: id,
        frequency_id: WEEKLY,
        quantity: None,
    };
    assert!(matches!(
        service.decompose_goal_at(&weekly, now()).unwrap_err(),
        ServiceError::Plan(PlanError::NoOccurrencesLeft { goal_id, .. }) if goal_id == id
    ));

    let unknown = DecompositionRequest {
        goal_id: id,
        frequency_id: 77,
        quantity: None,
    };
    assert!(matches!(
        service.decompose_goal_at(&unknown, now()).unwrap_err(),
        ServiceError::FrequencyNotFound(77)
    ));
}

#[test]
fn decompose_goal_past_deadline_requires_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = goal_service(&conn);
    let id = service.create_goal_at(&draft(dec!(100), 2), now()).unwrap().goal.id;

    let request = DecompositionRequest {
        goal_id: id,
        frequency_id: DAILY,
        quantity: Some(dec!(10)),
    };
    let result = service
        .decompose_goal_at(&request, now() + Duration::days(5))
        .unwrap();

    assert_eq!(result.required_quantity, Decimal::ZERO);
    assert_eq!(result.feasible, None);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({ "required_quantity": "0" })
    );
}
