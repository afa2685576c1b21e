//! Bar: one instrument's close (and optionally volume) for one trading day.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Daily bar as stored by the history store and consumed by the engine.
///
/// Two shapes share this type: the full form carries `volume`, the reduced
/// form (produced by compaction) leaves it `None`. On disk the fields use the
/// short keys `t`, `c` and `v` so existing history files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, milliseconds since the Unix epoch (UTC).
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(
        rename = "v",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_volume"
    )]
    pub volume: Option<u64>,
}

impl Bar {
    /// Full bar: timestamp, close and volume.
    pub fn new(timestamp_ms: i64, close: f64, volume: u64) -> Self {
        Self {
            timestamp_ms,
            close,
            volume: Some(volume),
        }
    }

    /// Reduced bar: timestamp and close only.
    pub fn reduced(timestamp_ms: i64, close: f64) -> Self {
        Self {
            timestamp_ms,
            close,
            volume: None,
        }
    }

    /// Full bar stamped at midnight UTC of `date`.
    pub fn on_date(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self::new(date_to_millis(date), close, volume)
    }

    /// The UTC calendar date of this bar, used as its trading date.
    pub fn trading_date(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.timestamp_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or(NaiveDate::MIN)
    }

    /// Copy of this bar with the volume dropped.
    pub fn without_volume(&self) -> Self {
        Self::reduced(self.timestamp_ms, self.close)
    }

    pub fn is_reduced(&self) -> bool {
        self.volume.is_none()
    }
}

/// Milliseconds since the epoch at midnight UTC of `date`.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Providers report volume as a JSON float (`7.03e7`); accept both shapes.
fn deserialize_volume<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.map(volume_from_f64))
}

/// Convert a provider volume figure to shares, clamping junk to zero.
pub fn volume_from_f64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}
