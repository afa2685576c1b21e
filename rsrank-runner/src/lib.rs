//! RS Rank Runner: run orchestration on top of `rsrank-core`.
//!
//! This crate provides:
//! - Run configuration (TOML with defaults, credential from the environment)
//! - Trading-date helpers for the daily target and the rebuild window
//! - The full-rebuild and daily-update orchestrators
//! - Progress reporting and summary statistics

pub mod calendar;
pub mod config;
pub mod progress;
pub mod rebuild;
pub mod run;
pub mod summary;
pub mod update;

pub use calendar::{rebuild_window, target_date};
pub use config::{BenchmarkConfig, ConfigError, OutputPaths, ProviderConfig, RunConfig};
pub use progress::{RunProgress, SilentProgress, StdoutProgress};
pub use rebuild::run_full_rebuild;
pub use run::{InstrumentOutcome, RunError, RunPhase, RunReport, RunStats};
pub use summary::{RankingStats, STRONG_RANK};
pub use update::run_daily_update;
