//! Filter/sort engine deriving the visible task list.
//!
//! # Responsibility
//! - Turn a store snapshot plus `FilterCriteria` into the ordered list a
//!   dashboard renders.
//!
//! # Invariants
//! - Pipeline order is fixed: status filter, text filter, stable sort.
//! - Output depends only on inputs; no clock reads, no randomness.
//! - Ties keep their relative input order for every sort key.

use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

/// Completion-state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Ascending by due date; undated tasks last.
    #[default]
    DueDate,
    /// Descending by severity.
    Priority,
    /// Newest first.
    CreatedAt,
}

/// Unrecognized filter or sort keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaParseError {
    #[error("unknown status filter `{0}`; expected all|completed|pending")]
    Status(String),
    #[error("unknown sort key `{0}`; expected dueDate|priority|createdAt")]
    SortKey(String),
}

impl FromStr for StatusFilter {
    type Err = CriteriaParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(CriteriaParseError::Status(other.to_string())),
        }
    }
}

impl FromStr for SortKey {
    type Err = CriteriaParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "duedate" | "due_date" | "due" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "createdat" | "created_at" | "created" => Ok(Self::CreatedAt),
            _ => Err(CriteriaParseError::SortKey(value.trim().to_string())),
        }
    }
}

/// Visible-list criteria owned by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub status: StatusFilter,
    pub sort_key: SortKey,
    /// Free text; blank means no text filtering.
    pub query: String,
}

impl FilterCriteria {
    pub fn new(status: StatusFilter, sort_key: SortKey, query: impl Into<String>) -> Self {
        Self {
            status,
            sort_key,
            query: query.into(),
        }
    }
}

/// Case-insensitive substring matcher over title and description.
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Returns `None` for blank queries.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_field(&task.title)
            || task
                .description
                .as_deref()
                .is_some_and(|description| self.matches_field(description))
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}

/// Derives the visible, ordered subsequence of `tasks` for `criteria`.
pub fn derive(tasks: &[Task], criteria: &FilterCriteria) -> Vec<Task> {
    let matcher = TextMatcher::new(&criteria.query);
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| criteria.status.matches(task))
        .filter(|task| matcher.as_ref().map_or(true, |m| m.matches(task)))
        .cloned()
        .collect();

    // `sort_by` is stable: equal keys keep input order.
    visible.sort_by(|a, b| compare(criteria.sort_key, a, b));
    visible
}

fn compare(key: SortKey, a: &Task, b: &Task) -> Ordering {
    match key {
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
        SortKey::CreatedAt => b.created_at.cmp(&a.created_at),
    }
}
