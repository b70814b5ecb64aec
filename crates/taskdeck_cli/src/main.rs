//! CLI dashboard entry point.
//!
//! # Responsibility
//! - Provide a small executable that exercises `taskdeck_core` end to end.
//! - Render the demo task list with the same filter/sort/stats rules the
//!   Flutter dashboard uses.

use chrono::Utc;
use clap::Parser;
use taskdeck_core::{
    aggregate, core_version, default_log_level, derive, due_label, init_logging, logging_status,
    FilterCriteria, SortKey, StatusFilter, Task, TaskStore,
};

const DEMO_OWNER_ID: &str = "demo-user";

#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about = "Print the demo task dashboard")]
struct Args {
    /// Completion filter: all, completed or pending.
    #[arg(long, default_value = "all")]
    status: StatusFilter,

    /// Sort key: dueDate, priority or createdAt.
    #[arg(long, default_value = "dueDate")]
    sort: SortKey,

    /// Case-insensitive text matched against title and description.
    #[arg(long, default_value = "")]
    query: String,

    /// Log level used when `--log-dir` is set; defaults per build mode.
    #[arg(long, env = "TASKDECK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when omitted.
    #[arg(long, env = "TASKDECK_LOG_DIR")]
    log_dir: Option<String>,
}

fn main() {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        match init_logging(level, log_dir) {
            Ok(()) => {
                if let Some((level, dir)) = logging_status() {
                    eprintln!("taskdeck: logging at {level} to {}", dir.display());
                }
            }
            Err(err) => eprintln!("taskdeck: logging disabled: {err}"),
        }
    }

    let mut store = TaskStore::new();
    if let Err(err) = store.seed_demo(DEMO_OWNER_ID) {
        eprintln!("taskdeck: seeding demo tasks failed: {err}");
        std::process::exit(1);
    }

    let now = Utc::now();
    let stats = aggregate(store.tasks(), now);
    println!("taskdeck {}", core_version());
    println!(
        "total={} completed={} pending={} overdue={}",
        stats.total, stats.completed, stats.pending, stats.overdue
    );

    let criteria = FilterCriteria::new(args.status, args.sort, args.query);
    let visible = derive(store.tasks(), &criteria);
    if visible.is_empty() {
        println!("No tasks found.");
        return;
    }
    for task in &visible {
        println!("{}", render_line(task, now));
    }
}

fn render_line(task: &Task, now: chrono::DateTime<Utc>) -> String {
    let mark = if task.completed { "x" } else { " " };
    let due = match task.due_date {
        Some(due) => {
            let label = due_label(due, now.date_naive());
            if task.is_overdue(now) {
                format!("due {label} (overdue)")
            } else {
                format!("due {label}")
            }
        }
        None => "no due date".to_string(),
    };
    format!("[{mark}] {:<28} {:<6} {due}", task.title, task.priority)
}

#[cfg(test)]
mod tests {
    use super::{render_line, Args};
    use chrono::{Duration, TimeZone, Utc};
    use clap::Parser;
    use taskdeck_core::{NewTask, Priority, SortKey, StatusFilter, TaskStore};

    #[test]
    fn args_parse_filter_and_sort() {
        let args = Args::parse_from([
            "taskdeck",
            "--status",
            "pending",
            "--sort",
            "priority",
            "--query",
            "report",
        ]);
        assert_eq!(args.status, StatusFilter::Pending);
        assert_eq!(args.sort, SortKey::Priority);
        assert_eq!(args.query, "report");
    }

    #[test]
    fn args_reject_unknown_status() {
        assert!(Args::try_parse_from(["taskdeck", "--status", "done"]).is_err());
    }

    #[test]
    fn render_line_marks_overdue_tasks() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let mut store = TaskStore::new();
        let task = store
            .create(
                NewTask::new("Pay rent", "user-1")
                    .due(now - Duration::days(3))
                    .priority(Priority::High),
            )
            .unwrap();

        let line = render_line(&task, now);
        assert!(line.starts_with("[ ] Pay rent"));
        assert!(line.contains("high"));
        assert!(line.contains("Jan 7, 2024 (overdue)"));
    }
}
