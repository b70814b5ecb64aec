//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record rendered by dashboard views.
//! - Provide input shapes for create/update flows and their validation.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `created_at` never changes after creation.
//! - `updated_at` is never earlier than `created_at`.
//! - `title` is never blank.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Opaque to callers; serialized as a hyphenated UUID string.
pub type TaskId = Uuid;

/// Task urgency with a fixed severity ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    /// Applied when a create request does not specify a priority.
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Severity rank used for ordering: high=3, medium=2, low=1.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TaskValidationError::InvalidPriority(other.to_string())),
        }
    }
}

/// Validation failures for task input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("invalid due date `{0}`; expected RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidDueDate(String),
    #[error("invalid priority `{0}`; expected low|medium|high")]
    InvalidPriority(String),
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning identity id. Not enforced by the store.
    pub user_id: String,
}

impl Task {
    /// Returns whether this task is still open and its due date has passed.
    ///
    /// A due date equal to `now` is not overdue yet.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Create request for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// `None` falls back to `Priority::Medium`.
    pub priority: Option<Priority>,
    pub owner_id: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Partial update merged over an existing task.
///
/// Outer `None` leaves a field untouched. For optional fields,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }
}

/// Rejects titles that are empty after trimming.
pub fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(())
}

/// Parses a due date from an ISO-8601 string.
///
/// Accepts a full RFC 3339 timestamp (any offset, normalized to UTC) or a
/// bare calendar date, which maps to midnight UTC. Past dates are allowed.
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, TaskValidationError> {
    let trimmed = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TaskValidationError::InvalidDueDate(trimmed.to_string()))
}
