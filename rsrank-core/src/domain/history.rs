//! Per-instrument rolling history owned by the history store.

use super::bar::Bar;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A symbol's stored bars plus when they were last touched.
///
/// The benchmark uses the same shape. Bars are kept sorted ascending by
/// timestamp with at most one bar per trading date; the only mutations are
/// appending the newest bar and dropping the oldest ones (see
/// [`crate::engine::CompactionPolicy::append`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentHistory {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "h")]
    pub bars: Vec<Bar>,
    #[serde(rename = "u")]
    pub last_updated: NaiveDateTime,
}

impl InstrumentHistory {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>, last_updated: NaiveDateTime) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
            last_updated,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Trading date of the newest stored bar.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(Bar::trading_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stamp() -> NaiveDateTime {
        d(2024, 6, 1).and_hms_opt(8, 30, 0).unwrap()
    }

    #[test]
    fn serializes_with_short_keys() {
        let h = InstrumentHistory::new("AAPL", vec![Bar::reduced(0, 1.0)], stamp());
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["s"], "AAPL");
        assert_eq!(json["h"][0]["c"], 1.0);
        assert_eq!(json["u"], "2024-06-01T08:30:00");
    }

    #[test]
    fn parses_fractional_second_timestamps() {
        let json = r#"{"s":"MSFT","h":[],"u":"2024-06-01T08:30:00.123456"}"#;
        let h: InstrumentHistory = serde_json::from_str(json).unwrap();
        assert_eq!(h.symbol, "MSFT");
        assert_eq!(h.last_updated.date(), d(2024, 6, 1));
    }

    #[test]
    fn last_date_is_newest_bar() {
        let h = InstrumentHistory::new(
            "X",
            vec![
                Bar::on_date(d(2024, 5, 30), 1.0, 1),
                Bar::on_date(d(2024, 5, 31), 2.0, 1),
            ],
            stamp(),
        );
        assert_eq!(h.last_date(), Some(d(2024, 5, 31)));
    }
}
