//! Per-instrument pipeline: coverage checks → align → returns → score.

use super::align::align;
use super::rank::ScoredInstrument;
use super::returns::{compute_returns, Horizon, RECENT_VOLUME_WINDOW};
use super::score::rs_score;
use super::MIN_COVERAGE_BARS;
use crate::domain::Bar;
use thiserror::Error;

/// Why an instrument was dropped from a run. None of these are fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("{symbol}: {bars} bars of history, need {required}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        required: usize,
    },

    #[error("benchmark has {bars} bars of history, need {required}")]
    InsufficientBenchmark { bars: usize, required: usize },

    #[error("{symbol}: fewer than {required} dates in common with the benchmark")]
    InsufficientAlignment { symbol: String, required: usize },
}

/// Score one instrument against the benchmark.
///
/// Both raw histories need at least a year of bars, and so does their
/// date intersection. An instrument that fails any of these is dropped,
/// never scored as zero.
pub fn evaluate_instrument(
    symbol: &str,
    bars: &[Bar],
    benchmark: &[Bar],
) -> Result<ScoredInstrument, EvaluationError> {
    if bars.len() < MIN_COVERAGE_BARS {
        return Err(EvaluationError::InsufficientHistory {
            symbol: symbol.to_string(),
            bars: bars.len(),
            required: MIN_COVERAGE_BARS,
        });
    }
    if benchmark.len() < MIN_COVERAGE_BARS {
        return Err(EvaluationError::InsufficientBenchmark {
            bars: benchmark.len(),
            required: MIN_COVERAGE_BARS,
        });
    }

    let insufficient_alignment = || EvaluationError::InsufficientAlignment {
        symbol: symbol.to_string(),
        required: MIN_COVERAGE_BARS,
    };

    let aligned = align(bars, benchmark).ok_or_else(insufficient_alignment)?;
    let profile = compute_returns(&aligned, bars, &Horizon::ALL, RECENT_VOLUME_WINDOW)
        .ok_or_else(insufficient_alignment)?;

    Ok(ScoredInstrument {
        symbol: symbol.to_string(),
        rs_score: rs_score(&profile.relative),
        avg_volume: profile.avg_recent_volume,
        relative: profile.relative,
        raw: profile.raw,
    })
}
