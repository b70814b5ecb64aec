//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable storage contract used by session bootstrap.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs surface storage failures; they never silently drop a
//!   write.

pub mod kv_store;
