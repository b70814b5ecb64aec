//! Dashboard counters over a task snapshot.

use crate::model::task::Task;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate counts. `completed + pending == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Pending tasks whose due date is strictly before the evaluation instant.
    pub overdue: usize,
}

/// Counts `tasks` as of `now`. Never reads a clock.
pub fn aggregate(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    tasks.iter().fold(TaskStats::default(), |mut stats, task| {
        stats.total += 1;
        if task.completed {
            stats.completed += 1;
        } else {
            stats.pending += 1;
        }
        if task.is_overdue(now) {
            stats.overdue += 1;
        }
        stats
    })
}
