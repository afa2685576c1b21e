//! The rankings artifact consumed by the front end.

use super::{read_json, write_json_atomic, ArtifactError};
use crate::engine::{Horizon, RankedRecord};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    FullRebuild,
    DailyIncremental,
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateType::FullRebuild => write!(f, "full rebuild"),
            UpdateType::DailyIncremental => write!(f, "daily incremental"),
        }
    }
}

/// One ranked instrument as written to `rankings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecordView {
    pub symbol: String,
    pub rs_rank: u8,
    /// Rounded to 4 decimals.
    pub rs_score: f64,
    /// Display form: `1.2M`, `450k`, `999`.
    pub avg_volume: String,
    pub raw_volume: u64,
    pub relative_3m: String,
    pub relative_12m: String,
    pub stock_return_3m: String,
    pub stock_return_12m: String,
}

impl From<&RankedRecord> for RankedRecordView {
    fn from(r: &RankedRecord) -> Self {
        Self {
            symbol: r.symbol.clone(),
            rs_rank: r.rs_rank,
            rs_score: round4(r.rs_score),
            avg_volume: format_volume(r.avg_volume),
            raw_volume: r.avg_volume,
            relative_3m: format_return(r.relative.get(Horizon::ThreeMonth)),
            relative_12m: format_return(r.relative.get(Horizon::TwelveMonth)),
            stock_return_3m: format_return(r.raw.get(Horizon::ThreeMonth)),
            stock_return_12m: format_return(r.raw.get(Horizon::TwelveMonth)),
        }
    }
}

/// Contents of `rankings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingsArtifact {
    pub last_updated: NaiveDateTime,
    pub formula_used: String,
    pub total_stocks: usize,
    /// Display label, e.g. `S&P 500 (SPY)`.
    pub benchmark: String,
    pub update_type: UpdateType,
    /// Trading date the daily update was computed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_date: Option<NaiveDate>,
    pub data: Vec<RankedRecordView>,
}

impl RankingsArtifact {
    pub fn from_records(
        records: &[RankedRecord],
        formula_used: String,
        benchmark: String,
        update_type: UpdateType,
        data_date: Option<NaiveDate>,
        last_updated: NaiveDateTime,
    ) -> Self {
        let data: Vec<RankedRecordView> = records.iter().map(RankedRecordView::from).collect();
        Self {
            last_updated,
            formula_used,
            total_stocks: data.len(),
            benchmark,
            update_type,
            data_date,
            data,
        }
    }

    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactError> {
        read_json(path)
    }

    /// Atomically write as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json_atomic(path, self, true)
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// `1.2M` from a million up, `450k` from a thousand up, plain below that.
pub fn format_volume(volume: u64) -> String {
    let v = volume as f64;
    if volume >= 1_000_000 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.0}k", v / 1_000.0)
    } else {
        volume.to_string()
    }
}

/// A fractional return as a one-decimal percentage: `0.1234` → `12.3%`.
pub fn format_return(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Inverse of [`format_return`], to within its rounding.
pub fn parse_return(s: &str) -> Option<f64> {
    s.trim()
        .strip_suffix('%')?
        .trim()
        .parse::<f64>()
        .ok()
        .map(|pct| pct / 100.0)
}
