// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod cycle;
pub mod decision;
pub mod dispatch;
pub mod engine;
pub mod fetch;
pub mod ladder;
pub mod metrics;
pub mod notify;
pub mod snapshot;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::cycle::{run_cycle, CycleDeps, CycleReport};
pub use crate::decision::{Decision, ThresholdTable};
pub use crate::engine::ComparisonPolicy;
pub use crate::snapshot::{StateStore, StreakSnapshot};
