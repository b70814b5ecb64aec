//! Core domain logic for the Taskdeck dashboard.
//! This crate is the single source of truth for task and session invariants;
//! rendering, routing and styling live in the layers that consume it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::identity::{
    CredentialValidationError, Identity, LoginCredentials, RegisterCredentials,
};
pub use model::task::{
    parse_due_date, NewTask, Priority, Task, TaskId, TaskPatch, TaskValidationError,
};
pub use repo::kv_store::{KeyValueStore, KvError, KvResult, MemoryKvStore, SqliteKvStore};
pub use service::clock::{Clock, ManualClock, SystemClock};
pub use service::session::{
    AuthError, Session, SessionError, SessionHolder, SessionResult, SessionState, StubVerifier,
    Verified, Verifier, AUTH_TOKEN_KEY, IDENTITY_KEY,
};
pub use service::task_store::{TaskError, TaskResult, TaskStore};
pub use view::due::{due_label, DueLabel};
pub use view::filter::{derive, CriteriaParseError, FilterCriteria, SortKey, StatusFilter};
pub use view::stats::{aggregate, TaskStats};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
