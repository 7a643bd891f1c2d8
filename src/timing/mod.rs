//! Execution-time tracking for closures, futures and code blocks

pub mod tracker;

pub use tracker::{BlockTimer, TimeTracker, TimingSummary, DEFAULT_MAX_COUNT};
