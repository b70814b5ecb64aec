//! Task store: owner of the canonical task collection.
//!
//! # Responsibility
//! - Provide create/update/toggle/delete/list entry points for callers.
//! - Stamp `created_at`/`updated_at` through an injected `Clock`.
//!
//! # Invariants
//! - Task ids are unique for the lifetime of the store.
//! - `id` and `created_at` are never modified after creation.
//! - `updated_at` never decreases for a given task.
//! - A failed operation leaves the collection unchanged.

use crate::model::task::{
    validate_title, NewTask, Priority, Task, TaskId, TaskPatch, TaskValidationError,
};
use crate::service::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

pub type TaskResult<T> = Result<T, TaskError>;

/// Task store operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// In-memory, insertion-ordered task collection.
///
/// New tasks become the head of the collection; no other ordering is kept.
#[derive(Debug, Clone)]
pub struct TaskStore<C: Clock = SystemClock> {
    tasks: Vec<Task>,
    clock: C,
}

impl TaskStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TaskStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TaskStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            tasks: Vec::new(),
            clock,
        }
    }

    /// Creates a task and inserts it at the head of the collection.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` when the title is blank.
    pub fn create(&mut self, input: NewTask) -> TaskResult<Task> {
        if let Err(err) = validate_title(&input.title) {
            warn!("event=task_create module=store status=rejected reason={err}");
            return Err(err.into());
        }

        let now = self.clock.now();
        let task = Task {
            id: self.fresh_id(),
            title: input.title,
            description: input.description,
            completed: false,
            due_date: input.due_date,
            priority: input.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            user_id: input.owner_id,
        };
        self.tasks.insert(0, task.clone());

        debug!(
            "event=task_create module=store status=ok task_id={} total={}",
            task.id,
            self.tasks.len()
        );
        Ok(task)
    }

    /// Merges `patch` over an existing task and refreshes `updated_at`.
    ///
    /// # Errors
    /// - `NotFound` when `id` is absent.
    /// - `Validation(EmptyTitle)` when the merged title would be blank.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> TaskResult<Task> {
        let now = self.clock.now();
        let task = self.find_mut(id)?;
        if let Some(title) = patch.title.as_deref() {
            validate_title(title)?;
        }
        let TaskPatch {
            title,
            description,
            due_date,
            priority,
            completed,
        } = patch;

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = description {
            task.description = description;
        }
        if let Some(due_date) = due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        if let Some(completed) = completed {
            task.completed = completed;
        }
        touch(task, now);

        debug!("event=task_update module=store status=ok task_id={id}");
        Ok(task.clone())
    }

    /// Flips completion state and refreshes `updated_at`.
    pub fn toggle_completion(&mut self, id: TaskId) -> TaskResult<Task> {
        let now = self.clock.now();
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        touch(task, now);

        debug!(
            "event=task_toggle module=store status=ok task_id={id} completed={}",
            task.completed
        );
        Ok(task.clone())
    }

    /// Removes a task.
    ///
    /// Deleting an id that is already gone reports `NotFound` and changes
    /// nothing.
    pub fn delete(&mut self, id: TaskId) -> TaskResult<()> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskError::NotFound(id))?;
        self.tasks.remove(index);

        debug!(
            "event=task_delete module=store status=ok task_id={id} total={}",
            self.tasks.len()
        );
        Ok(())
    }

    /// Returns a snapshot of the collection in store order.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrowed view of the collection in store order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Loads the three dashboard demo tasks for `owner_id`.
    ///
    /// Due dates are relative to the store clock: +2 days, -1 day (already
    /// completed) and +7 days. Returns the created tasks in store order.
    pub fn seed_demo(&mut self, owner_id: &str) -> TaskResult<Vec<Task>> {
        let now = self.clock.now();
        let demo = demo_tasks(now, owner_id);
        let mut created = Vec::with_capacity(demo.len());
        for (input, completed) in demo.into_iter().rev() {
            let task = self.create(input)?;
            let task = if completed {
                self.toggle_completion(task.id)?
            } else {
                task
            };
            created.insert(0, task);
        }
        Ok(created)
    }

    fn find_mut(&mut self, id: TaskId) -> TaskResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let candidate = Uuid::new_v4();
            if self.get(candidate).is_none() {
                return candidate;
            }
        }
    }
}

fn touch(task: &mut Task, now: DateTime<Utc>) {
    task.updated_at = now.max(task.updated_at);
}

fn demo_tasks(now: DateTime<Utc>, owner_id: &str) -> Vec<(NewTask, bool)> {
    vec![
        (
            NewTask::new("Complete project proposal", owner_id)
                .description("Finish the quarterly project proposal for client review")
                .due(now + Duration::days(2))
                .priority(Priority::High),
            false,
        ),
        (
            NewTask::new("Review team performance", owner_id)
                .description("Conduct monthly team performance reviews")
                .due(now - Duration::days(1))
                .priority(Priority::Medium),
            true,
        ),
        (
            NewTask::new("Update documentation", owner_id)
                .description("Update the API documentation with new endpoints")
                .due(now + Duration::days(7))
                .priority(Priority::Low),
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{touch, TaskStore};
    use crate::model::task::NewTask;
    use crate::service::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn touch_never_moves_updated_at_backwards() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let mut store = TaskStore::with_clock(&clock);
        let mut task = store.create(NewTask::new("t", "u")).unwrap();

        let earlier = task.updated_at - Duration::hours(1);
        touch(&mut task, earlier);
        assert_eq!(task.updated_at, task.created_at);
    }

    #[test]
    fn seed_demo_keeps_dashboard_order() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let mut store = TaskStore::with_clock(&clock);
        let seeded = store.seed_demo("1").unwrap();

        let titles: Vec<_> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Complete project proposal",
                "Review team performance",
                "Update documentation"
            ]
        );
        assert_eq!(seeded, store.list());
        assert!(store.tasks()[1].completed);
        assert!(store.tasks().iter().all(|t| t.user_id == "1"));
    }
}
