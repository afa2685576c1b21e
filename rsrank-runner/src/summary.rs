//! Summary statistics over a rankings artifact, as printed after a run and
//! by `rsrank show`.

use chrono::NaiveDate;
use rsrank_core::artifacts::RankingsArtifact;

/// Rank at or above which an instrument counts as a leader.
pub const STRONG_RANK: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct RankingStats {
    pub count: usize,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub average_score: f64,
    /// Instruments ranked [`STRONG_RANK`] or better.
    pub strong_count: usize,
    pub data_date: Option<NaiveDate>,
}

impl RankingStats {
    /// `None` for an artifact with no entries.
    pub fn from_artifact(artifact: &RankingsArtifact) -> Option<Self> {
        let scores: Vec<f64> = artifact
            .data
            .iter()
            .map(|r| r.rs_score)
            .filter(|s| s.is_finite())
            .collect();
        if scores.is_empty() {
            return None;
        }

        let highest_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let average_score = scores.iter().sum::<f64>() / scores.len() as f64;

        Some(Self {
            count: artifact.data.len(),
            highest_score,
            lowest_score,
            average_score,
            strong_count: artifact
                .data
                .iter()
                .filter(|r| r.rs_rank >= STRONG_RANK)
                .count(),
            data_date: artifact.data_date,
        })
    }
}
