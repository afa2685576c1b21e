//! RS Rank Core: bars, alignment, returns, RS scoring, ranking, history compaction.
//!
//! This crate contains the heart of the relative strength engine:
//! - Domain types (bars, instrument histories)
//! - Date alignment of an instrument against the benchmark
//! - Multi-horizon trailing and relative returns
//! - The fixed-weight RS score and 1–99 percentile ranking
//! - The compaction policy behind the rolling history store
//! - Market-data provider trait with a Polygon REST implementation
//! - JSON artifacts (rankings and history)

pub mod artifacts;
pub mod data;
pub mod domain;
pub mod engine;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine outputs can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::InstrumentHistory>();
        require_sync::<domain::InstrumentHistory>();
        require_send::<engine::AlignedSeries>();
        require_sync::<engine::AlignedSeries>();
        require_send::<engine::ScoredInstrument>();
        require_sync::<engine::ScoredInstrument>();
        require_send::<engine::RankedRecord>();
        require_sync::<engine::RankedRecord>();
        require_send::<engine::CompactionPolicy>();
        require_sync::<engine::CompactionPolicy>();
        require_send::<artifacts::RankingsArtifact>();
        require_sync::<artifacts::RankingsArtifact>();
        require_send::<artifacts::HistoryArtifact>();
        require_sync::<artifacts::HistoryArtifact>();
    }
}
