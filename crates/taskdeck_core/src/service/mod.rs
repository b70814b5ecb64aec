//! Core use-case services.
//!
//! # Responsibility
//! - Own mutable domain state (task collection, current session).
//! - Keep UI/FFI layers decoupled from storage and time sources.

pub mod clock;
pub mod session;
pub mod task_store;
