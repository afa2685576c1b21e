//! RS engine: align → returns → score → rank, plus history compaction.
//!
//! Everything in here is pure; fetching and persistence live in
//! [`crate::data`] and [`crate::artifacts`].

pub mod align;
pub mod compaction;
pub mod evaluate;
pub mod rank;
pub mod returns;
pub mod score;

/// One year of trading days: the minimum coverage for a history (and for
/// its alignment with the benchmark) to be scored.
pub const MIN_COVERAGE_BARS: usize = 252;

pub use align::{align, align_with_min, AlignedPoint, AlignedSeries};
pub use compaction::{offset_span, AppendOutcome, CompactionPolicy, OffsetSpan};
pub use evaluate::{evaluate_instrument, EvaluationError};
pub use rank::{percentile_rank, rank, RankError, RankedRecord, ScoredInstrument};
pub use returns::{
    average_recent_volume, compute_returns, Horizon, HorizonReturns, ReturnProfile,
    RECENT_VOLUME_WINDOW,
};
pub use score::{formula_description, horizon_weight, rs_score};
