//! Instrument/benchmark date alignment.
//!
//! Given an instrument's bars and the benchmark's bars, keep only the trading
//! dates present in both. Unlike a multi-symbol union there is nothing to
//! fill: a date missing from either side is simply not part of the series.

use super::MIN_COVERAGE_BARS;
use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One common trading date with both closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub benchmark_close: f64,
    /// Instrument volume, when the stored bar still carries it.
    pub volume: Option<u64>,
}

/// Date-intersected instrument and benchmark closes.
///
/// Invariant: dates are strictly increasing, and index `i` refers to the same
/// trading date on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    points: Vec<AlignedPoint>,
}

impl AlignedSeries {
    pub fn points(&self) -> &[AlignedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&AlignedPoint> {
        self.points.last()
    }

    /// The point `offset` positions before the last one.
    pub fn back(&self, offset: usize) -> Option<&AlignedPoint> {
        let last = self.points.len().checked_sub(1)?;
        self.points.get(last.checked_sub(offset)?)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}

/// Align with the default one-year minimum.
pub fn align(instrument: &[Bar], benchmark: &[Bar]) -> Option<AlignedSeries> {
    align_with_min(instrument, benchmark, MIN_COVERAGE_BARS)
}

/// Intersect two bar sequences on trading date.
///
/// Inputs are sorted defensively (stable, so ties keep input order). If a
/// series carries two bars for the same date the later one wins. Returns
/// `None` when either side is empty or fewer than `min_points` dates are
/// common to both.
pub fn align_with_min(
    instrument: &[Bar],
    benchmark: &[Bar],
    min_points: usize,
) -> Option<AlignedSeries> {
    if instrument.is_empty() || benchmark.is_empty() {
        return None;
    }

    let by_date = |bars: &[Bar]| -> BTreeMap<NaiveDate, Bar> {
        let mut sorted = bars.to_vec();
        sorted.sort_by_key(|b| b.timestamp_ms);
        sorted.into_iter().map(|b| (b.trading_date(), b)).collect()
    };

    let benchmark_by_date = by_date(benchmark);
    let points: Vec<AlignedPoint> = by_date(instrument)
        .into_iter()
        .filter_map(|(date, bar)| {
            benchmark_by_date.get(&date).map(|bm| AlignedPoint {
                date,
                close: bar.close,
                benchmark_close: bm.close,
                volume: bar.volume,
            })
        })
        .collect();

    if points.len() < min_points {
        return None;
    }

    Some(AlignedSeries { points })
}
