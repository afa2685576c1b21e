//! Trading-date arithmetic for run scheduling.
//!
//! Only weekends are treated as non-trading days. A holiday target date
//! simply yields an empty grouped-daily response upstream.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The trading date a daily update run on `today` should fetch: yesterday,
/// moved back to Friday when yesterday falls on a weekend.
pub fn target_date(today: NaiveDate) -> NaiveDate {
    let yesterday = today - Duration::days(1);
    match yesterday.weekday() {
        Weekday::Sat => yesterday - Duration::days(1),
        Weekday::Sun => yesterday - Duration::days(2),
        _ => yesterday,
    }
}

/// `[today - lookback_days, today]`, the request window of a full rebuild.
pub fn rebuild_window(today: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(lookback_days)), today)
}
