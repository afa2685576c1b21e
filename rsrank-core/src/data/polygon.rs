//! Polygon.io REST client.
//!
//! Three endpoints are used: per-ticker daily aggregates for the rebuild,
//! grouped daily bars for the incremental update, and the paginated
//! reference tickers listing for the universe. Every request is paced,
//! carries the key as the `apiKey` query parameter, and goes through one
//! bounded retry loop with exponential backoff (a 429 waits a fixed
//! `rate_limit_wait` instead).

use super::pacer::Pacer;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::bar::{volume_from_f64, Bar};
use chrono::NaiveDate;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable holding the Polygon API key.
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Connection and retry settings for [`PolygonProvider`].
#[derive(Debug)]
pub struct PolygonSettings {
    pub base_url: String,
    pub api_key: SecretString,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on each further retry.
    pub base_delay: Duration,
    /// Fixed wait after an HTTP 429.
    pub rate_limit_wait: Duration,
    /// Minimum spacing between any two requests.
    pub min_interval: Duration,
    pub timeout: Duration,
}

impl PolygonSettings {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            max_retries: 1,
            base_delay: Duration::from_secs(1),
            rate_limit_wait: Duration::from_secs(30),
            min_interval: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
        }
    }

    /// Settings with the key read from `POLYGON_API_KEY`.
    pub fn from_env() -> Result<Self, DataError> {
        Self::from_env_var(API_KEY_ENV)
    }

    /// Settings with the key read from `var`. Unset or blank is an error.
    pub fn from_env_var(var: &'static str) -> Result<Self, DataError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(SecretString::new(key.into()))),
            _ => Err(DataError::MissingCredential(var)),
        }
    }

    /// Delay before retry number `retry` (1-based) after `error`.
    fn retry_delay(&self, retry: u32, error: Option<&DataError>) -> Duration {
        match error {
            Some(DataError::RateLimited { .. }) => self.rate_limit_wait,
            _ => self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1)),
        }
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Option<Vec<AggBar>>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    t: i64,
    c: f64,
    #[serde(default)]
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GroupedResponse {
    #[serde(default)]
    results: Option<Vec<GroupedBar>>,
}

#[derive(Debug, Deserialize)]
struct GroupedBar {
    #[serde(rename = "T")]
    ticker: String,
    t: i64,
    c: f64,
    #[serde(default)]
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickersPage {
    #[serde(default)]
    results: Vec<TickerRef>,
    #[serde(default)]
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerRef {
    ticker: String,
}

fn to_bar(t: i64, c: f64, v: Option<f64>) -> Option<Bar> {
    if c.is_finite() && c > 0.0 {
        Some(Bar::new(t, c, v.map(volume_from_f64).unwrap_or(0)))
    } else {
        None
    }
}

fn bars_from_aggs(symbol: &str, resp: AggsResponse) -> Result<Vec<Bar>, DataError> {
    match resp.status.as_deref() {
        Some("NOT_FOUND") => {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
        Some("ERROR") => {
            return Err(DataError::ResponseFormatChanged(format!(
                "{symbol}: {}",
                resp.error.unwrap_or_else(|| "unspecified error".into())
            )))
        }
        _ => {}
    }

    let mut bars: Vec<Bar> = resp
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|b| to_bar(b.t, b.c, b.v))
        .collect();
    bars.sort_by_key(|b| b.timestamp_ms);
    Ok(bars)
}

fn bars_from_grouped(resp: GroupedResponse) -> HashMap<String, Bar> {
    resp.results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|b| to_bar(b.t, b.c, b.v).map(|bar| (b.ticker, bar)))
        .collect()
}

/// Polygon.io market data provider (blocking).
pub struct PolygonProvider {
    client: reqwest::blocking::Client,
    settings: PolygonSettings,
    pacer: Pacer,
}

impl PolygonProvider {
    pub fn new(settings: PolygonSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            pacer: Pacer::new(settings.min_interval),
            settings,
        })
    }

    pub fn settings(&self) -> &PolygonSettings {
        &self.settings
    }

    fn aggs_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v2/aggs/ticker/{symbol}/range/1/day/{start}/{end}",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn grouped_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/v2/aggs/grouped/locale/us/market/stocks/{date}",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn tickers_url(&self) -> String {
        format!(
            "{}/v3/reference/tickers",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    ///
    /// 401/403 and other 4xx statuses fail immediately; 404 comes back as
    /// `Http { status: 404 }` for the caller to interpret.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T, DataError> {
        let mut last_error: Option<DataError> = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = self.settings.retry_delay(attempt, last_error.as_ref());
                debug!(%context, attempt, ?delay, "retrying after backoff");
                std::thread::sleep(delay);
            }

            self.pacer.wait();
            let request = self
                .client
                .get(url)
                .query(query)
                .query(&[("apiKey", self.settings.api_key.expose_secret())]);

            match request.send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        warn!(
                            %context,
                            wait_secs = self.settings.rate_limit_wait.as_secs(),
                            "rate limited by Polygon"
                        );
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: self.settings.rate_limit_wait.as_secs(),
                        });
                        continue;
                    }

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(DataError::AuthenticationRejected {
                            status: status.as_u16(),
                        });
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Http {
                            status: status.as_u16(),
                            message: format!("{context}: server error"),
                        });
                        continue;
                    }

                    if !status.is_success() {
                        let body = resp.text().unwrap_or_default();
                        return Err(DataError::Http {
                            status: status.as_u16(),
                            message: format!("{context}: {}", body.chars().take(200).collect::<String>()),
                        });
                    }

                    return resp.json::<T>().map_err(|e| {
                        DataError::ResponseFormatChanged(format!("{context}: {e}"))
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Client("max retries exceeded".into())))
    }
}

impl MarketDataProvider for PolygonProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn list_tickers(&self) -> Result<Vec<String>, DataError> {
        let mut tickers = Vec::new();
        let first_url = self.tickers_url();
        let mut page: TickersPage = self.get_json(
            &first_url,
            &[("market", "stocks"), ("active", "true"), ("limit", "1000")],
            "reference tickers",
        )?;

        loop {
            tickers.extend(page.results.into_iter().map(|t| t.ticker));
            info!(count = tickers.len(), "fetched ticker page");

            // next_url already carries the original filters and a cursor.
            match page.next_url {
                Some(next) if !next.is_empty() => {
                    page = self.get_json(&next, &[], "reference tickers")?;
                }
                _ => break,
            }
        }

        Ok(tickers)
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        if start > end {
            return Err(DataError::InvalidDateRange { start, end });
        }

        let url = self.aggs_url(symbol, start, end);
        let resp: AggsResponse = self
            .get_json(
                &url,
                &[("adjusted", "true"), ("sort", "asc"), ("limit", "50000")],
                symbol,
            )
            .map_err(|e| match e {
                DataError::Http { status: 404, .. } => DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                other => other,
            })?;

        bars_from_aggs(symbol, resp)
    }

    fn fetch_grouped_daily(&self, date: NaiveDate) -> Result<HashMap<String, Bar>, DataError> {
        let url = self.grouped_url(date);
        let resp: GroupedResponse =
            self.get_json(&url, &[("adjusted", "true")], "grouped daily")?;
        let bars = bars_from_grouped(resp);
        info!(%date, symbols = bars.len(), "fetched grouped daily bars");
        Ok(bars)
    }
}
