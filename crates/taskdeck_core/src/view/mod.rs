//! Pure derivations over task snapshots.
//!
//! # Responsibility
//! - Compute what a dashboard renders: the filtered/sorted list, counters,
//!   due date labels.
//!
//! # Invariants
//! - Nothing here owns state or reads a clock; "now" is always a parameter.

pub mod due;
pub mod filter;
pub mod stats;
