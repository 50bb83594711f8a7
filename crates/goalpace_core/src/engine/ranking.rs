//! Task ranking and view ordering.
//!
//! # Invariants
//! - Base rank: goal importance descending (missing = -1), then creation
//!   time descending. A missing creation time on either side compares
//!   equal.
//! - The base pass is a stable binary insertion sort, so equal records keep
//!   their input order even though the comparator is not transitive.
//! - View order is a stable partition: urgent records first, each group in
//!   ascending base rank.

use crate::model::task::TaskRecord;
use std::cmp::{Ordering, Reverse};

const MISSING_IMPORTANCE: i32 = -1;

/// Assigns 1-based base ranks and returns records in view order.
pub fn rank_tasks(mut records: Vec<TaskRecord>) -> Vec<TaskRecord> {
    sort_by_base_order(&mut records);
    for (index, record) in records.iter_mut().enumerate() {
        record.order = index + 1;
    }

    records.sort_by_key(|record| (Reverse(record.is_urgent()), record.order));
    records
}

fn sort_by_base_order(records: &mut [TaskRecord]) {
    for index in 1..records.len() {
        let (mut low, mut high) = (0, index);
        while low < high {
            let mid = (low + high) / 2;
            if base_order(&records[index], &records[mid]) == Ordering::Less {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        records[low..=index].rotate_right(1);
    }
}

fn base_order(left: &TaskRecord, right: &TaskRecord) -> Ordering {
    importance(right)
        .cmp(&importance(left))
        .then_with(|| match (left.task.created_at, right.task.created_at) {
            (Some(l), Some(r)) => r.cmp(&l),
            _ => Ordering::Equal,
        })
}

fn importance(record: &TaskRecord) -> i32 {
    record
        .goal_importance
        .map_or(MISSING_IMPORTANCE, i32::from)
}

#[cfg(test)]
mod tests {
    use super::rank_tasks;
    use crate::model::frequency::{Frequency, FrequencyKind};
    use crate::model::task::{Task, TaskRecord};
    use chrono::{NaiveDate, NaiveDateTime};

    fn created(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn record(name: &str, importance: Option<u8>, day: Option<u32>, urgent: bool) -> TaskRecord {
        let mut task = Task::new(name, Frequency::of_kind(2, FrequencyKind::Daily));
        task.created_at = day.map(created);
        task.urgent = urgent;
        TaskRecord {
            task,
            goal_name: importance.map(|_| "goal".to_string()),
            goal_importance: importance,
            goal_unit: None,
            order: 0,
        }
    }

    fn names(records: &[TaskRecord]) -> Vec<&str> {
        records.iter().map(|r| r.task.name.as_str()).collect()
    }

    #[test]
    fn base_order_prefers_importance_then_recency() {
        let ranked = rank_tasks(vec![
            record("loose", None, Some(9), false),
            record("old-high", Some(5), Some(1), false),
            record("mid", Some(3), Some(4), false),
            record("new-high", Some(5), Some(8), false),
        ]);

        assert_eq!(names(&ranked), vec!["new-high", "old-high", "mid", "loose"]);
        let orders: Vec<usize> = ranked.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn urgent_tasks_float_first_keeping_base_rank() {
        let ranked = rank_tasks(vec![
            record("a", Some(5), Some(3), false),
            record("b", Some(1), Some(3), true),
            record("c", None, Some(1), true),
            record("d", Some(5), Some(1), false),
            record("e", Some(4), Some(7), true),
        ]);

        assert_eq!(names(&ranked), vec!["e", "b", "c", "a", "d"]);
        let orders: Vec<usize> = ranked.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![3, 4, 5, 1, 2]);
    }

    #[test]
    fn undated_task_ties_with_dated_peer_of_same_importance() {
        let ranked = rank_tasks(vec![
            record("x", Some(2), None, false),
            record("y", Some(2), Some(2), false),
        ]);
        assert_eq!(names(&ranked), vec!["x", "y"]);

        let ranked = rank_tasks(vec![
            record("x", Some(2), None, false),
            record("y", Some(2), Some(2), false),
            record("z", Some(2), None, false),
        ]);
        assert_eq!(names(&ranked), vec!["x", "y", "z"]);
    }

    #[test]
    fn undated_task_still_yields_to_higher_importance() {
        let ranked = rank_tasks(vec![
            record("undated-low", Some(1), None, false),
            record("dated-high", Some(4), Some(3), false),
            record("undated-high", Some(4), None, false),
        ]);
        assert_eq!(names(&ranked), vec!["dated-high", "undated-high", "undated-low"]);
    }

    #[test]
    fn empty_input_ranks_to_empty_output() {
        assert!(rank_tasks(Vec::new()).is_empty());
    }
}
