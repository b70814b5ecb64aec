//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the process-wide app state (task store + session holder) that
//!   core deliberately does not keep globally.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Task operations require a signed-in session.
//! - Timestamps cross the boundary as RFC 3339 UTC strings.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::executor::block_on;
use log::warn;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use taskdeck_core::{
    aggregate, core_version as core_version_inner, derive, due_label,
    init_logging as init_logging_inner, parse_due_date, ping as ping_inner, FilterCriteria,
    LoginCredentials, NewTask, Priority, RegisterCredentials, SessionHolder, SortKey,
    SqliteKvStore, StatusFilter, StubVerifier, Task, TaskId, TaskPatch, TaskStore,
};
use uuid::Uuid;

const SESSION_DB_FILE_NAME: &str = "taskdeck_session.sqlite3";
static SESSION_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static APP_STATE: Mutex<Option<AppState>> = Mutex::new(None);

struct AppState {
    tasks: TaskStore,
    session: SessionHolder<SqliteKvStore>,
    verifier: StubVerifier,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Session snapshot returned by every session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

/// Task projection rendered by a task card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// RFC 3339 UTC timestamp.
    pub due_date: Option<String>,
    /// `Today`, `Tomorrow` or `MMM d, yyyy`.
    pub due_label: Option<String>,
    /// `low|medium|high`.
    pub priority: String,
    pub overdue: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Single-task mutation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Affected task after the operation; `None` on failure or delete.
    pub task: Option<TaskItem>,
    pub message: String,
}

/// Visible task list for the current criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksViewResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksStatsResponse {
    pub ok: bool,
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    pub overdue: u32,
    pub message: String,
}

impl SessionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            authenticated: false,
            user_id: None,
            name: None,
            email: None,
            message: message.into(),
        }
    }
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<TaskItem>) -> Self {
        Self {
            ok: true,
            task,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task: None,
            message: message.into(),
        }
    }
}

impl TasksViewResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Restores a persisted sign-in (app startup).
///
/// # FFI contract
/// - Sync call; reads the session database once.
/// - Never panics; corrupt persisted data resolves to signed-out.
#[flutter_rust_bridge::frb(sync)]
pub fn session_bootstrap() -> SessionResponse {
    match with_app(|app| {
        app.session.bootstrap();
        session_snapshot(app, true, "Session restored.")
    }) {
        Ok(response) => response,
        Err(err) => SessionResponse::failure(format!("session_bootstrap failed: {err}")),
    }
}

/// Signs in with email and password.
///
/// # FFI contract
/// - Runs on the FRB worker pool (not `sync`); verification may await.
/// - Never panics.
pub fn session_login(email: String, password: String) -> SessionResponse {
    let credentials = LoginCredentials::new(email.trim(), password);
    let outcome = with_app(|app| {
        let verifier = &app.verifier;
        let result = block_on(app.session.login(&credentials, verifier));
        match result {
            Ok(identity) => session_snapshot(app, true, format!("Logged in as {}.", identity.name)),
            Err(err) => session_snapshot(app, false, format!("session_login failed: {err}")),
        }
    });
    outcome.unwrap_or_else(|err| SessionResponse::failure(format!("session_login failed: {err}")))
}

/// Creates an account and signs it in.
///
/// # FFI contract
/// - Runs on the FRB worker pool (not `sync`).
/// - Password confirmation mismatch fails without contacting the verifier.
pub fn session_register(
    name: String,
    email: String,
    password: String,
    confirm_password: String,
) -> SessionResponse {
    let credentials = RegisterCredentials {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
        confirm_password,
    };
    let outcome = with_app(|app| {
        let verifier = &app.verifier;
        let result = block_on(app.session.register(&credentials, verifier));
        match result {
            Ok(identity) => session_snapshot(
                app,
                true,
                format!("Account created for {}.", identity.name),
            ),
            Err(err) => session_snapshot(app, false, format!("session_register failed: {err}")),
        }
    });
    outcome
        .unwrap_or_else(|err| SessionResponse::failure(format!("session_register failed: {err}")))
}

/// Signs out, clears persisted credentials and drops the task list.
#[flutter_rust_bridge::frb(sync)]
pub fn session_logout() -> SessionResponse {
    let outcome = with_app(|app| {
        app.tasks = TaskStore::new();
        match app.session.logout() {
            Ok(()) => session_snapshot(app, true, "Logged out."),
            Err(err) => session_snapshot(app, false, format!("session_logout failed: {err}")),
        }
    });
    outcome.unwrap_or_else(|err| SessionResponse::failure(format!("session_logout failed: {err}")))
}

/// Returns the current session without side effects.
#[flutter_rust_bridge::frb(sync)]
pub fn session_current() -> SessionResponse {
    with_app(|app| session_snapshot(app, true, "OK"))
        .unwrap_or_else(|err| SessionResponse::failure(format!("session_current failed: {err}")))
}

/// Loads the demo tasks for the signed-in user.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_seed_demo() -> TasksViewResponse {
    let outcome = with_app(|app| {
        let owner_id = current_owner(app)?;
        let seeded = app
            .tasks
            .seed_demo(&owner_id)
            .map_err(|err| err.to_string())?;
        let now = Utc::now();
        Ok::<_, String>(TasksViewResponse {
            ok: true,
            message: format!("Seeded {} task(s).", seeded.len()),
            items: seeded.iter().map(|task| to_task_item(task, now)).collect(),
        })
    });
    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) | Err(err) => {
            TasksViewResponse::failure(format!("tasks_seed_demo failed: {err}"))
        }
    }
}

/// Creates a task for the signed-in user.
///
/// Input semantics:
/// - `due_date`: RFC 3339 timestamp or `YYYY-MM-DD`; blank means none.
/// - `priority`: `low|medium|high`; `None`/blank means `medium`.
/// - blank `description` is stored as none.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
) -> TaskActionResponse {
    let outcome = with_app(|app| {
        let owner_id = current_owner(app)?;
        let mut input = NewTask::new(title.trim(), owner_id);
        input.description = description.and_then(non_blank);
        input.due_date = parse_optional_due(due_date)?.flatten();
        input.priority = parse_optional_priority(priority)?;
        let task = app.tasks.create(input).map_err(|err| err.to_string())?;
        Ok::<_, String>(to_task_item(&task, Utc::now()))
    });
    action_response("task_create", "Task created.", outcome)
}

/// Applies a partial update.
///
/// Input semantics:
/// - `None` leaves a field untouched.
/// - `Some("")` for `description`/`due_date` clears the stored value.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
) -> TaskActionResponse {
    let outcome = with_app(|app| {
        current_owner(app)?;
        let id = parse_task_id(&task_id)?;
        let patch = TaskPatch {
            title: title.map(|value| value.trim().to_string()),
            description: description.map(non_blank),
            due_date: parse_optional_due(due_date)?,
            priority: parse_optional_priority(priority)?,
            completed: None,
        };
        let task = app.tasks.update(id, patch).map_err(|err| err.to_string())?;
        Ok::<_, String>(to_task_item(&task, Utc::now()))
    });
    action_response("task_update", "Task updated.", outcome)
}

/// Flips completion for one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: String) -> TaskActionResponse {
    let outcome = with_app(|app| {
        current_owner(app)?;
        let id = parse_task_id(&task_id)?;
        let task = app
            .tasks
            .toggle_completion(id)
            .map_err(|err| err.to_string())?;
        Ok::<_, String>(to_task_item(&task, Utc::now()))
    });
    action_response("task_toggle", "Task status updated.", outcome)
}

/// Deletes one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> TaskActionResponse {
    let outcome = with_app(|app| {
        current_owner(app)?;
        let id = parse_task_id(&task_id)?;
        app.tasks.delete(id).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(Ok(())) => TaskActionResponse::success("Task deleted.", None),
        Ok(Err(err)) | Err(err) => {
            TaskActionResponse::failure(format!("task_delete failed: {err}"))
        }
    }
}

/// Returns the visible task list for the given criteria.
///
/// Input semantics:
/// - `status`: `all|completed|pending`; blank means `all`.
/// - `sort_by`: `dueDate|priority|createdAt`; blank means `dueDate`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_view(status: String, sort_by: String, query: String) -> TasksViewResponse {
    let outcome = with_app(|app| {
        current_owner(app)?;
        let criteria = FilterCriteria::new(
            parse_or_default::<StatusFilter>(&status)?,
            parse_or_default::<SortKey>(&sort_by)?,
            query,
        );
        let now = Utc::now();
        let items = derive(app.tasks.tasks(), &criteria)
            .iter()
            .map(|task| to_task_item(task, now))
            .collect::<Vec<_>>();
        let message = if items.is_empty() {
            "No tasks found.".to_string()
        } else {
            format!("Showing {} task(s).", items.len())
        };
        Ok::<_, String>(TasksViewResponse {
            ok: true,
            items,
            message,
        })
    });
    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) | Err(err) => TasksViewResponse::failure(format!("tasks_view failed: {err}")),
    }
}

/// Returns dashboard counters evaluated at the current instant.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_stats() -> TasksStatsResponse {
    let outcome = with_app(|app| {
        current_owner(app)?;
        Ok::<_, String>(aggregate(app.tasks.tasks(), Utc::now()))
    });
    match outcome {
        Ok(Ok(stats)) => TasksStatsResponse {
            ok: true,
            total: saturating_u32(stats.total),
            completed: saturating_u32(stats.completed),
            pending: saturating_u32(stats.pending),
            overdue: saturating_u32(stats.overdue),
            message: "OK".to_string(),
        },
        Ok(Err(err)) | Err(err) => TasksStatsResponse {
            ok: false,
            total: 0,
            completed: 0,
            pending: 0,
            overdue: 0,
            message: format!("tasks_stats failed: {err}"),
        },
    }
}

fn with_app<T>(f: impl FnOnce(&mut AppState) -> T) -> Result<T, String> {
    let mut guard = APP_STATE.lock().unwrap_or_else(|poisoned| {
        warn!("event=ffi_state module=ffi status=recovered error_code=mutex_poisoned");
        poisoned.into_inner()
    });

    if guard.is_none() {
        let db_path = resolve_session_db_path();
        let store = SqliteKvStore::open(&db_path)
            .map_err(|err| format!("session DB open failed: {err}"))?;
        let mut session = SessionHolder::new(store);
        session.bootstrap();
        *guard = Some(AppState {
            tasks: TaskStore::new(),
            session,
            verifier: StubVerifier::default(),
        });
    }

    match guard.as_mut() {
        Some(app) => Ok(f(app)),
        None => Err("app state unavailable".to_string()),
    }
}

fn resolve_session_db_path() -> PathBuf {
    SESSION_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TASKDECK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(SESSION_DB_FILE_NAME)
        })
        .clone()
}

fn session_snapshot(app: &AppState, ok: bool, message: impl Into<String>) -> SessionResponse {
    let identity = app.session.identity();
    SessionResponse {
        ok,
        authenticated: identity.is_some(),
        user_id: identity.map(|identity| identity.id.clone()),
        name: identity.map(|identity| identity.name.clone()),
        email: identity.map(|identity| identity.email.clone()),
        message: message.into(),
    }
}

fn current_owner(app: &AppState) -> Result<String, String> {
    app.session
        .identity()
        .map(|identity| identity.id.clone())
        .ok_or_else(|| "not signed in".to_string())
}

fn action_response(
    operation: &str,
    success_message: &str,
    outcome: Result<Result<TaskItem, String>, String>,
) -> TaskActionResponse {
    match outcome {
        Ok(Ok(item)) => TaskActionResponse::success(success_message, Some(item)),
        Ok(Err(err)) | Err(err) => TaskActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{}`", raw.trim()))
}

fn parse_optional_due(raw: Option<String>) -> Result<Option<Option<DateTime<Utc>>>, String> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(Some(None)),
        Some(value) => parse_due_date(&value)
            .map(|due| Some(Some(due)))
            .map_err(|err| err.to_string()),
    }
}

fn parse_optional_priority(raw: Option<String>) -> Result<Option<Priority>, String> {
    match raw.and_then(non_blank) {
        None => Ok(None),
        Some(value) => Priority::from_str(&value)
            .map(Some)
            .map_err(|err| err.to_string()),
    }
}

fn parse_or_default<T>(raw: &str) -> Result<T, String>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    raw.parse::<T>().map_err(|err| err.to_string())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_task_item(task: &Task, now: DateTime<Utc>) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        due_date: task.due_date.map(format_timestamp),
        due_label: task
            .due_date
            .map(|due| due_label(due, now.date_naive()).to_string()),
        priority: task.priority.to_string(),
        overdue: task.is_overdue(now),
        created_at: format_timestamp(task.created_at),
        updated_at: format_timestamp(task.updated_at),
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
