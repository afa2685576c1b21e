//! Market data provider trait and structured error types.
//!
//! The trait abstracts over the upstream REST API so the orchestrators can be
//! driven by an in-memory provider in tests.

use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

/// Structured error types for provider calls.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retried after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("provider rejected the credential (HTTP {status})")]
    AuthenticationRejected { status: u16 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("invalid date range: {start} > {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl DataError {
    /// Worth another attempt: connection trouble, throttling, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. } => true,
            DataError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The instrument does not exist (or no longer trades) upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::SymbolNotFound { .. })
    }
}

/// Source of daily bars and of the tradable universe.
///
/// Implementations own their retry and pacing policy; callers see either
/// data or a final [`DataError`].
pub trait MarketDataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// All active tradable tickers, unfiltered. Pagination is internal.
    fn list_tickers(&self) -> Result<Vec<String>, DataError>;

    /// Daily bars for one symbol over `[start, end]`, ascending by timestamp.
    /// An empty result is not an error.
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;

    /// One bar per symbol for a single trading date. Empty on a market holiday.
    fn fetch_grouped_daily(&self, date: NaiveDate) -> Result<HashMap<String, Bar>, DataError>;
}
