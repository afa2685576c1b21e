//! Trailing returns over the IBD horizons.

use super::align::AlignedSeries;
use crate::domain::Bar;
use std::collections::BTreeMap;
use std::fmt;

/// Number of most recent raw bars averaged for the volume figure.
pub const RECENT_VOLUME_WINDOW: usize = 20;

/// A named trailing lookback, expressed in trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Horizon {
    ThreeMonth,
    SixMonth,
    NineMonth,
    TwelveMonth,
}

impl Horizon {
    pub const ALL: [Horizon; 4] = [
        Horizon::ThreeMonth,
        Horizon::SixMonth,
        Horizon::NineMonth,
        Horizon::TwelveMonth,
    ];

    /// Offset from the last point, in aligned points.
    pub const fn trading_days(self) -> usize {
        match self {
            Horizon::ThreeMonth => 63,
            Horizon::SixMonth => 126,
            Horizon::NineMonth => 189,
            Horizon::TwelveMonth => 252,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Horizon::ThreeMonth => "3m",
            Horizon::SixMonth => "6m",
            Horizon::NineMonth => "9m",
            Horizon::TwelveMonth => "12m",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-horizon return values. Absent horizons read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizonReturns(BTreeMap<Horizon, f64>);

impl HorizonReturns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, horizon: Horizon) -> f64 {
        self.0.get(&horizon).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, horizon: Horizon, value: f64) {
        self.0.insert(horizon, value);
    }

    pub fn contains(&self, horizon: Horizon) -> bool {
        self.0.contains_key(&horizon)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Horizon, f64)> + '_ {
        self.0.iter().map(|(h, v)| (*h, *v))
    }
}

impl FromIterator<(Horizon, f64)> for HorizonReturns {
    fn from_iter<I: IntoIterator<Item = (Horizon, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything the scorer and the rankings artifact need from one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnProfile {
    /// Instrument return minus benchmark return, per horizon.
    pub relative: HorizonReturns,
    /// The instrument's own trailing return, per horizon.
    pub raw: HorizonReturns,
    pub avg_recent_volume: f64,
}

/// Simple return from `old` to `current`; zero when `old` is not positive.
fn trailing_return(current: f64, old: f64) -> f64 {
    if old > 0.0 {
        (current - old) / old
    } else {
        0.0
    }
}

/// Compute per-horizon returns from an aligned series.
///
/// For a horizon of `d` trading days the old point is `len - 1 - d`. A series
/// with `d` points or fewer reports zero for that horizon rather than failing.
/// Volume comes from `raw_bars` (the instrument's own, unaligned history),
/// not from the aligned series. Returns `None` only for an empty series.
pub fn compute_returns(
    aligned: &AlignedSeries,
    raw_bars: &[Bar],
    horizons: &[Horizon],
    recent_volume_window: usize,
) -> Option<ReturnProfile> {
    let current = aligned.last()?;

    let mut relative = HorizonReturns::new();
    let mut raw = HorizonReturns::new();

    for &horizon in horizons {
        let days = horizon.trading_days();
        let (stock_return, benchmark_return) = if aligned.len() > days {
            match aligned.back(days) {
                Some(old) => (
                    trailing_return(current.close, old.close),
                    trailing_return(current.benchmark_close, old.benchmark_close),
                ),
                None => (0.0, 0.0),
            }
        } else {
            (0.0, 0.0)
        };

        raw.insert(horizon, stock_return);
        relative.insert(horizon, stock_return - benchmark_return);
    }

    Some(ReturnProfile {
        relative,
        raw,
        avg_recent_volume: average_recent_volume(raw_bars, recent_volume_window),
    })
}

/// Mean volume over the last `window` bars, counting only positive volumes.
///
/// Reduced bars (no volume) are skipped like zero-volume bars. Zero when
/// nothing in the window qualifies.
pub fn average_recent_volume(raw_bars: &[Bar], window: usize) -> f64 {
    let mut sorted = raw_bars.to_vec();
    sorted.sort_by_key(|b| b.timestamp_ms);

    let start = sorted.len().saturating_sub(window);
    let volumes: Vec<f64> = sorted[start..]
        .iter()
        .filter_map(|b| b.volume)
        .filter(|&v| v > 0)
        .map(|v| v as f64)
        .collect();

    if volumes.is_empty() {
        0.0
    } else {
        volumes.iter().sum::<f64>() / volumes.len() as f64
    }
}
