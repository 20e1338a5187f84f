//! # zapbot-stats
//!
//! Per-group chat statistics: counters, word and emoji frequencies,
//! JSON snapshots on disk and the report texts served by `/stats`.

pub mod engine;
pub mod extract;
pub mod model;
pub mod report;
pub mod store;

pub use engine::StatsEngine;
pub use model::{GroupStats, UserStats};
pub use store::SnapshotStore;
