//! Domain model for the task dashboard.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep input shapes (create/patch/credentials) next to the records they
//!   produce.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - At most one `Identity` is current per session holder.

pub mod identity;
pub mod task;
