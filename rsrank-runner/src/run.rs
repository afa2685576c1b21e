//! Run lifecycle shared by both orchestrators: phases, errors, tallies.

use crate::config::ConfigError;
use crate::progress::RunProgress;
use chrono::NaiveDate;
use rsrank_core::artifacts::{ArtifactError, RankingsArtifact, UpdateType};
use rsrank_core::data::DataError;
use rsrank_core::engine::RankError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Where a run is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    LoadingHistory,
    FetchingBenchmark,
    FetchingUniverse,
    PerInstrumentLoop,
    Ranking,
    Persisting,
    Done,
    Aborted,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::LoadingHistory => "loading history",
            RunPhase::FetchingBenchmark => "fetching benchmark",
            RunPhase::FetchingUniverse => "fetching universe",
            RunPhase::PerInstrumentLoop => "scoring instruments",
            RunPhase::Ranking => "ranking",
            RunPhase::Persisting => "persisting",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Fatal run errors. Nothing is written when a run ends with one of these.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("benchmark {symbol} unavailable: {reason}")]
    MissingBenchmark { symbol: String, reason: String },

    #[error("no history at {path} (run a full rebuild first)")]
    MissingHistory { path: PathBuf },

    #[error("no market data for {date} (market closed?)")]
    NoMarketData { date: NaiveDate },

    #[error("no instruments survived scoring")]
    NoSurvivors,

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("ranking error: {0}")]
    Rank(#[from] RankError),
}

/// What happened to one instrument in the per-instrument loop.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    Scored { rs_score: f64 },
    /// Too few raw bars, or too little overlap with the benchmark.
    Insufficient { reason: String },
    /// Unknown or delisted upstream.
    NotFound,
    /// No bar for the target date; history left as is.
    NoBar,
    /// The stored history already ends after the new bar.
    OutOfOrder,
    Failed { reason: String },
}

/// Per-run tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Instruments considered by the loop.
    pub total: usize,
    pub scored: usize,
    pub insufficient: usize,
    pub not_found: usize,
    pub no_bar: usize,
    pub out_of_order: usize,
    pub failed: usize,
    /// Daily runs: instruments whose target bar was already stored.
    pub already_current: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &InstrumentOutcome) {
        self.total += 1;
        match outcome {
            InstrumentOutcome::Scored { .. } => self.scored += 1,
            InstrumentOutcome::Insufficient { .. } => self.insufficient += 1,
            InstrumentOutcome::NotFound => self.not_found += 1,
            InstrumentOutcome::NoBar => self.no_bar += 1,
            InstrumentOutcome::OutOfOrder => self.out_of_order += 1,
            InstrumentOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Everything that was considered but not scored.
    pub fn dropped(&self) -> usize {
        self.total - self.scored
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} scored, {} insufficient, {} not found, {} without a bar, {} out of order, {} failed",
            self.total,
            self.scored,
            self.insufficient,
            self.not_found,
            self.no_bar,
            self.out_of_order,
            self.failed
        )
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub update_type: UpdateType,
    pub data_date: Option<NaiveDate>,
    pub stats: RunStats,
    /// The artifact that was written.
    pub rankings: RankingsArtifact,
}

/// Tracks the current phase, logging and reporting each transition.
pub(crate) struct PhaseTracker<'a> {
    current: RunPhase,
    progress: &'a dyn RunProgress,
}

impl<'a> PhaseTracker<'a> {
    pub(crate) fn new(progress: &'a dyn RunProgress) -> Self {
        Self {
            current: RunPhase::Idle,
            progress,
        }
    }

    pub(crate) fn current(&self) -> RunPhase {
        self.current
    }

    pub(crate) fn enter(&mut self, next: RunPhase) {
        info!(from = %self.current, to = %next, "run phase");
        self.current = next;
        self.progress.on_phase(next);
    }

    pub(crate) fn progress(&self) -> &'a dyn RunProgress {
        self.progress
    }

    /// Close out a run: `Done` on success, `Aborted` (with a warning naming
    /// the phase that failed) on error.
    pub(crate) fn finish<T>(mut self, result: Result<T, RunError>) -> Result<T, RunError> {
        match result {
            Ok(v) => {
                self.enter(RunPhase::Done);
                Ok(v)
            }
            Err(e) => {
                warn!(phase = %self.current(), error = %e, "run aborted");
                self.enter(RunPhase::Aborted);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct PhaseLog(RefCell<Vec<RunPhase>>);

    impl RunProgress for PhaseLog {
        fn on_phase(&self, phase: RunPhase) {
            self.0.borrow_mut().push(phase);
        }
    }

    #[test]
    fn stats_tally_outcomes() {
        let mut stats = RunStats::default();
        stats.record(&InstrumentOutcome::Scored { rs_score: 0.1 });
        stats.record(&InstrumentOutcome::NotFound);
        stats.record(&InstrumentOutcome::NoBar);
        stats.record(&InstrumentOutcome::Insufficient {
            reason: "short".into(),
        });
        assert_eq!(stats.total, 4);
        assert_eq!(stats.scored, 1);
        assert_eq!(stats.dropped(), 3);
    }

    #[test]
    fn stats_line_reports_every_tally() {
        let mut stats = RunStats::default();
        stats.record(&InstrumentOutcome::Scored { rs_score: 0.1 });
        stats.record(&InstrumentOutcome::OutOfOrder);
        stats.record(&InstrumentOutcome::Failed {
            reason: "timeout".into(),
        });
        assert_eq!(stats.out_of_order, 1);
        assert_eq!(
            stats.to_string(),
            "3: 1 scored, 0 insufficient, 0 not found, 0 without a bar, 1 out of order, 1 failed"
        );
    }

    #[test]
    fn tracker_ends_in_done_or_aborted() {
        let log = PhaseLog::default();
        let mut tracker = PhaseTracker::new(&log);
        tracker.enter(RunPhase::Ranking);
        assert_eq!(tracker.current(), RunPhase::Ranking);
        let result: Result<(), RunError> = tracker.finish(Err(RunError::NoSurvivors));
        assert!(result.is_err());
        assert_eq!(*log.0.borrow(), vec![RunPhase::Ranking, RunPhase::Aborted]);

        let log = PhaseLog::default();
        let tracker = PhaseTracker::new(&log);
        assert_eq!(tracker.finish(Ok(5)).unwrap(), 5);
        assert_eq!(*log.0.borrow(), vec![RunPhase::Done]);
    }

    #[test]
    fn phase_names() {
        assert_eq!(RunPhase::PerInstrumentLoop.to_string(), "scoring instruments");
        assert_eq!(RunPhase::Aborted.to_string(), "aborted");
    }
}
