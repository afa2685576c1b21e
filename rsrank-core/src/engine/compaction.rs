//! History compaction: how a full download becomes a stored rolling window,
//! and how that window grows by one bar per daily run.
//!
//! Downsampled bars sit at every `stride`-th trading day, so an index offset
//! into a compacted history covers more calendar time than the same offset
//! into a full one. Horizons on the daily path are therefore approximate;
//! [`offset_span`] reports what an offset actually spans.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stride, recent window and cap for stored histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    /// Keep every `stride`-th bar of the older part. 1 disables downsampling.
    pub stride: usize,
    /// Number of most recent bars kept in full.
    pub recent_window: usize,
    /// Cap on stored bars after a daily append.
    pub max_window: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            stride: 5,
            recent_window: 30,
            max_window: 300,
        }
    }
}

/// What [`CompactionPolicy::append`] did with a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// A bar for that trading date is already stored.
    Duplicate,
    /// Older than the newest stored bar.
    OutOfOrder,
}

impl CompactionPolicy {
    /// No downsampling: every bar kept in full up to `max_window`.
    pub fn uncompacted() -> Self {
        Self {
            stride: 1,
            ..Self::default()
        }
    }

    /// Build the stored history from a full download.
    ///
    /// All but the newest `recent_window` bars are downsampled to every
    /// `stride`-th bar (starting with the oldest) and reduced to
    /// timestamp + close; the newest `recent_window` bars follow in full.
    /// Input is sorted by timestamp first. No cap is applied here.
    pub fn compact(&self, full: &[Bar]) -> Vec<Bar> {
        let mut sorted = full.to_vec();
        sorted.sort_by_key(|b| b.timestamp_ms);

        let split = sorted.len().saturating_sub(self.recent_window);
        let (older, recent) = sorted.split_at(split);

        older
            .iter()
            .step_by(self.stride.max(1))
            .map(Bar::without_volume)
            .chain(recent.iter().copied())
            .collect()
    }

    /// Append the newest bar, then trim to the `max_window` most recent.
    ///
    /// A bar whose trading date is already stored, or which is older than the
    /// newest stored bar, leaves `history` untouched.
    pub fn append(&self, history: &mut Vec<Bar>, bar: Bar) -> AppendOutcome {
        let date = bar.trading_date();
        if history.iter().any(|b| b.trading_date() == date) {
            return AppendOutcome::Duplicate;
        }
        if history
            .last()
            .is_some_and(|last| bar.timestamp_ms < last.timestamp_ms)
        {
            return AppendOutcome::OutOfOrder;
        }

        history.push(bar);
        if history.len() > self.max_window {
            let excess = history.len() - self.max_window;
            history.drain(..excess);
        }
        AppendOutcome::Appended
    }
}

/// Calendar coverage of an index offset into a stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetSpan {
    pub offset: usize,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub calendar_days: i64,
}

impl OffsetSpan {
    /// Rough trading-day equivalent of the span (252 sessions a year).
    pub fn approx_trading_days(&self) -> i64 {
        (self.calendar_days as f64 * 252.0 / 365.0).round() as i64
    }
}

/// Dates between the bar `offset` positions before the last and the last.
/// `None` when the history is not longer than `offset`.
pub fn offset_span(bars: &[Bar], offset: usize) -> Option<OffsetSpan> {
    let last = bars.last()?;
    let old = bars.get(bars.len().checked_sub(1 + offset)?)?;
    let (from, to) = (old.trading_date(), last.trading_date());
    Some(OffsetSpan {
        offset,
        from,
        to,
        calendar_days: (to - from).num_days(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekdays(n: usize) -> Vec<Bar> {
        let mut date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if chrono::Datelike::weekday(&date).number_from_monday() <= 5 {
                out.push(Bar::on_date(date, 100.0 + out.len() as f64, 1_000));
            }
            date = date.succ_opt().unwrap();
        }
        out
    }

    #[test]
    fn default_policy() {
        let p = CompactionPolicy::default();
        assert_eq!((p.stride, p.recent_window, p.max_window), (5, 30, 300));
    }

    #[test]
    fn compact_downsamples_older_part() {
        let full = weekdays(300);
        let stored = CompactionPolicy::default().compact(&full);

        // 270 older bars at stride 5, then 30 recent.
        assert_eq!(stored.len(), 54 + 30);
        assert_eq!(stored[0], full[0].without_volume());
        assert_eq!(stored[1], full[5].without_volume());
        assert_eq!(stored[53], full[265].without_volume());
        assert!(stored[..54].iter().all(Bar::is_reduced));
        assert_eq!(&stored[54..], &full[270..]);
    }

    #[test]
    fn compact_short_history_keeps_everything() {
        let full = weekdays(12);
        assert_eq!(CompactionPolicy::default().compact(&full), full);
    }

    #[test]
    fn compact_sorts_input() {
        let mut full = weekdays(40);
        full.reverse();
        let stored = CompactionPolicy::default().compact(&full);
        assert!(stored.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    }

    #[test]
    fn stride_one_keeps_all_bars_reduced_then_full() {
        let full = weekdays(300);
        let stored = CompactionPolicy::uncompacted().compact(&full);
        assert_eq!(stored.len(), 300);
        assert!(stored[269].is_reduced());
        assert!(!stored[270].is_reduced());
    }

    #[test]
    fn append_adds_and_truncates() {
        let policy = CompactionPolicy {
            max_window: 5,
            ..CompactionPolicy::default()
        };
        let bars = weekdays(6);
        let mut history = bars[..5].to_vec();

        assert_eq!(policy.append(&mut history, bars[5]), AppendOutcome::Appended);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0], bars[1]);
        assert_eq!(history[4], bars[5]);
    }

    #[test]
    fn append_rejects_duplicate_date() {
        let policy = CompactionPolicy::default();
        let bars = weekdays(3);
        let mut history = bars.clone();

        let mut again = bars[2];
        again.close = 999.0;
        assert_eq!(policy.append(&mut history, again), AppendOutcome::Duplicate);
        assert_eq!(history, bars);
    }

    #[test]
    fn append_rejects_out_of_order() {
        let policy = CompactionPolicy::default();
        let bars = weekdays(4);
        let mut history = vec![bars[0], bars[2], bars[3]];

        assert_eq!(policy.append(&mut history, bars[1]), AppendOutcome::OutOfOrder);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn append_to_empty_history() {
        let mut history = Vec::new();
        let bar = weekdays(1)[0];
        assert_eq!(
            CompactionPolicy::default().append(&mut history, bar),
            AppendOutcome::Appended
        );
        assert_eq!(history, vec![bar]);
    }

    #[test]
    fn offset_span_widens_after_compaction() {
        let full = weekdays(300);
        let stored = CompactionPolicy::default().compact(&full);

        let full_span = offset_span(&full, 63).unwrap();
        let stored_span = offset_span(&stored, 63).unwrap();
        // 63 weekdays is about 13 weeks; through the stride it is far longer.
        assert_eq!(full_span.calendar_days, 63 / 5 * 7 + 63 % 5);
        assert!(stored_span.calendar_days > 2 * full_span.calendar_days);
        assert!(stored_span.approx_trading_days() > 63);
    }

    #[test]
    fn one_missing_session_shifts_the_stride_phase() {
        let policy = CompactionPolicy::default();
        let benchmark = weekdays(300);
        let mut instrument = benchmark.clone();
        instrument.remove(3);

        let stored_bench = policy.compact(&benchmark);
        let stored_inst = policy.compact(&instrument);
        let in_step = crate::engine::align_with_min(&stored_bench, &stored_bench, 1).unwrap();
        let shifted = crate::engine::align_with_min(&stored_inst, &stored_bench, 1).unwrap();

        // 54 downsampled + 30 recent when in phase; after the gap only the
        // first downsampled date and the recent window still coincide.
        assert_eq!(in_step.len(), 84);
        assert_eq!(shifted.len(), 31);
    }

    #[test]
    fn offset_span_needs_enough_bars() {
        let bars = weekdays(10);
        assert!(offset_span(&bars, 10).is_none());
        assert_eq!(offset_span(&bars, 9).unwrap().from, bars[0].trading_date());
        assert!(offset_span(&[], 0).is_none());
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let p: CompactionPolicy = serde_json::from_str(r#"{"stride":1}"#).unwrap();
        assert_eq!(p, CompactionPolicy::uncompacted());
    }
}
