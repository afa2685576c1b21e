//! Progress callbacks for long-running rebuilds and updates.

use crate::run::{InstrumentOutcome, RunPhase, RunStats};

/// Progress callback for the orchestrators. All methods default to no-ops.
pub trait RunProgress {
    /// Called on every phase transition.
    fn on_phase(&self, _phase: RunPhase) {}

    /// Called before an instrument is processed.
    fn on_instrument(&self, _symbol: &str, _index: usize, _total: usize) {}

    /// Called after an instrument is processed.
    fn on_instrument_done(&self, _symbol: &str, _outcome: &InstrumentOutcome) {}

    /// Called once the per-instrument loop is finished.
    fn on_loop_complete(&self, _stats: &RunStats) {}
}

/// Reports nothing.
pub struct SilentProgress;

impl RunProgress for SilentProgress {}

/// Prints phases and a line every `every` instruments to stdout.
pub struct StdoutProgress {
    pub every: usize,
}

impl Default for StdoutProgress {
    fn default() -> Self {
        Self { every: 100 }
    }
}

impl RunProgress for StdoutProgress {
    fn on_phase(&self, phase: RunPhase) {
        match phase {
            RunPhase::Idle | RunPhase::Done => {}
            RunPhase::Aborted => println!("Run aborted."),
            other => println!("== {other} =="),
        }
    }

    fn on_instrument(&self, symbol: &str, index: usize, total: usize) {
        if self.every > 0 && (index % self.every == 0 || index + 1 == total) {
            println!("[{}/{}] {symbol}", index + 1, total);
        }
    }

    fn on_instrument_done(&self, symbol: &str, outcome: &InstrumentOutcome) {
        if let InstrumentOutcome::Failed { reason } = outcome {
            println!("  FAIL: {symbol}: {reason}");
        }
    }

    fn on_loop_complete(&self, stats: &RunStats) {
        println!("\nProcessed {stats}");
    }
}
