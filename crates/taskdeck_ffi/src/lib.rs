//! Flutter-facing adapter over `taskdeck_core`.

pub mod api;
