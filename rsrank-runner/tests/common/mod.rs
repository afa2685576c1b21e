//! Shared fixtures for orchestrator tests: an in-memory provider and
//! synthetic weekday bar series.

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rsrank_core::data::{DataError, MarketDataProvider};
use rsrank_core::domain::Bar;
use rsrank_runner::RunConfig;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Canned response for one symbol's range query.
#[derive(Debug, Clone)]
pub enum Scripted {
    Bars(Vec<Bar>),
    NotFound,
    Fail,
}

/// In-memory `MarketDataProvider`. Range queries are filtered to the
/// requested dates like the real endpoint.
#[derive(Default)]
pub struct MockProvider {
    pub tickers: Vec<String>,
    pub daily: HashMap<String, Scripted>,
    pub grouped: HashMap<NaiveDate, HashMap<String, Bar>>,
    pub calls: RefCell<Vec<String>>,
}

impl MockProvider {
    pub fn with_ticker(mut self, symbol: &str, response: Scripted) -> Self {
        self.tickers.push(symbol.to_string());
        self.daily.insert(symbol.to_string(), response);
        self
    }

    /// Benchmark or other symbol served by range queries but not listed.
    pub fn with_unlisted(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.daily.insert(symbol.to_string(), Scripted::Bars(bars));
        self
    }

    pub fn with_grouped(mut self, date: NaiveDate, bars: &[(&str, f64, u64)]) -> Self {
        let day = self.grouped.entry(date).or_default();
        for &(symbol, close, volume) in bars {
            day.insert(symbol.to_string(), Bar::on_date(date, close, volume));
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_tickers(&self) -> Result<Vec<String>, DataError> {
        self.calls.borrow_mut().push("list_tickers".into());
        Ok(self.tickers.clone())
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        self.calls.borrow_mut().push(format!("daily:{symbol}"));
        match self.daily.get(symbol) {
            Some(Scripted::Bars(bars)) => Ok(bars
                .iter()
                .filter(|b| (start..=end).contains(&b.trading_date()))
                .copied()
                .collect()),
            Some(Scripted::Fail) => Err(DataError::Http {
                status: 500,
                message: "scripted failure".into(),
            }),
            Some(Scripted::NotFound) | None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn fetch_grouped_daily(&self, date: NaiveDate) -> Result<HashMap<String, Bar>, DataError> {
        self.calls.borrow_mut().push(format!("grouped:{date}"));
        Ok(self.grouped.get(&date).cloned().unwrap_or_default())
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Tuesday 2024-03-26, 06:00. The daily target is Monday 2024-03-25.
pub fn run_time() -> NaiveDateTime {
    d(2024, 3, 26).and_hms_opt(6, 0, 0).unwrap()
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `count` weekday bars ending on `last` (inclusive), closes growing
/// geometrically by `daily_growth`.
pub fn weekday_bars(last: NaiveDate, count: usize, start_close: f64, daily_growth: f64) -> Vec<Bar> {
    let mut dates = Vec::with_capacity(count);
    let mut date = last;
    while dates.len() < count {
        if is_weekday(date) {
            dates.push(date);
        }
        date = date.pred_opt().unwrap();
    }
    dates.reverse();

    let mut close = start_close;
    dates
        .into_iter()
        .map(|date| {
            let bar = Bar::on_date(date, close, 1_000_000);
            close *= 1.0 + daily_growth;
            bar
        })
        .collect()
}

/// Every weekday from 460 calendar days before the run through the Friday
/// before it: enough for a 450-day rebuild window.
pub fn full_year(start_close: f64, daily_growth: f64) -> Vec<Bar> {
    weekday_bars(d(2024, 3, 22), 330, start_close, daily_growth)
}

/// Config writing both artifacts into `dir`, without pacing concerns.
pub fn config_in(dir: &Path) -> RunConfig {
    let mut config = RunConfig::default();
    config.paths.rankings = dir.join("rankings.json");
    config.paths.history = dir.join("historical_data.json");
    config
}
