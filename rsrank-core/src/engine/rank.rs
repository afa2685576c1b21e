//! Cross-sectional ranking: score order plus a 1–99 percentile.

use super::returns::HorizonReturns;
use std::cmp::Ordering;
use thiserror::Error;

/// An instrument that made it through alignment and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredInstrument {
    pub symbol: String,
    pub rs_score: f64,
    pub avg_volume: f64,
    pub relative: HorizonReturns,
    pub raw: HorizonReturns,
}

/// One row of the ranking output.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub symbol: String,
    pub rs_score: f64,
    /// Percentile rank, 1 (weakest) to 99 (strongest).
    pub rs_rank: u8,
    /// Average recent volume, truncated to whole shares.
    pub avg_volume: u64,
    pub relative: HorizonReturns,
    pub raw: HorizonReturns,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("cannot rank an empty universe")]
    EmptyUniverse,
}

/// Percentile for position `index` (0 = best) out of `total`.
///
/// `floor((total - index) / total × 99) + 1`, clamped to 99, so the leader
/// of any non-empty set gets 99 and nothing drops below 1.
pub fn percentile_rank(index: usize, total: usize) -> u8 {
    if total == 0 || index >= total {
        return 1;
    }
    let pct = (total - index) as u128 * 99 / total as u128 + 1;
    pct.min(99) as u8
}

/// Ordering key for a score: NaN sorts below every real score and signed
/// zeros compare equal.
fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else if score == 0.0 {
        0.0
    } else {
        score
    }
}

fn by_score_desc(a: &ScoredInstrument, b: &ScoredInstrument) -> Ordering {
    let (ka, kb) = (sort_key(a.rs_score), sort_key(b.rs_score));
    match kb.total_cmp(&ka) {
        // A NaN and a genuine -inf share a key; keep the NaN after it.
        Ordering::Equal => a.rs_score.is_nan().cmp(&b.rs_score.is_nan()),
        other => other,
    }
}

/// Sort descending by score (stable) and assign percentile ranks.
pub fn rank(mut scored: Vec<ScoredInstrument>) -> Result<Vec<RankedRecord>, RankError> {
    if scored.is_empty() {
        return Err(RankError::EmptyUniverse);
    }

    scored.sort_by(by_score_desc);
    let total = scored.len();

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedRecord {
            rs_rank: percentile_rank(i, total),
            avg_volume: truncate_volume(s.avg_volume),
            symbol: s.symbol,
            rs_score: s.rs_score,
            relative: s.relative,
            raw: s.raw,
        })
        .collect())
}

fn truncate_volume(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.trunc() as u64
    } else {
        0
    }
}
