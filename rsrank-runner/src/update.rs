//! Daily incremental update: extend the stored histories by one trading day
//! and re-rank.
//!
//! Horizons here are measured in stored bars, so over a downsampled history
//! an offset spans far more calendar time than its nominal trading days; each
//! run logs the benchmark's actual coverage.
//!
//! With the default compaction policy this path cannot succeed. A fresh
//! rebuild stores well under 252 bars per symbol, every instrument fails the
//! coverage check, and the run aborts with `NoSurvivors` before anything is
//! written, so the store never grows and the next run aborts the same way.
//! Instrument and benchmark are also downsampled independently from the start
//! of their own older parts: a single missing session shifts the stride phase
//! and most downsampled dates no longer intersect. Only a store built with
//! `stride = 1` is usable here.

use crate::calendar::target_date;
use crate::config::RunConfig;
use crate::progress::RunProgress;
use crate::run::{InstrumentOutcome, PhaseTracker, RunError, RunPhase, RunReport, RunStats};
use chrono::NaiveDateTime;
use rsrank_core::artifacts::{HistoryArtifact, RankingsArtifact, UpdateType};
use rsrank_core::data::MarketDataProvider;
use rsrank_core::domain::{Bar, InstrumentHistory};
use rsrank_core::engine::{
    evaluate_instrument, formula_description, offset_span, rank, AppendOutcome,
    CompactionPolicy, Horizon, OffsetSpan, ScoredInstrument,
};
use tracing::{debug, info, warn};

/// Run a daily update as of `now` (the target is the previous trading day).
///
/// The history artifact is read once at the start and written once at the
/// end. Any error returned here means nothing was written.
pub fn run_daily_update(
    provider: &dyn MarketDataProvider,
    config: &RunConfig,
    progress: &dyn RunProgress,
    now: NaiveDateTime,
) -> Result<RunReport, RunError> {
    let mut phases = PhaseTracker::new(progress);
    let result = update(provider, config, &mut phases, now);
    phases.finish(result)
}

fn update(
    provider: &dyn MarketDataProvider,
    config: &RunConfig,
    phases: &mut PhaseTracker<'_>,
    now: NaiveDateTime,
) -> Result<RunReport, RunError> {
    phases.enter(RunPhase::LoadingHistory);
    let mut history =
        HistoryArtifact::load(&config.paths.history)?.ok_or_else(|| RunError::MissingHistory {
            path: config.paths.history.clone(),
        })?;
    info!(
        instruments = history.instruments.len(),
        benchmark_bars = history.benchmark.len(),
        "history loaded"
    );
    for (horizon, span) in horizon_coverage(&history.benchmark) {
        match span {
            Some(span) => info!(
                %horizon,
                offset = span.offset,
                from = %span.from,
                to = %span.to,
                calendar_days = span.calendar_days,
                approx_trading_days = span.approx_trading_days(),
                "benchmark horizon coverage"
            ),
            None => debug!(
                %horizon,
                bars = history.benchmark.len(),
                "benchmark too short for horizon"
            ),
        }
    }

    let date = target_date(now.date());
    let benchmark_symbol = config.benchmark.symbol.as_str();

    phases.enter(RunPhase::FetchingBenchmark);
    let grouped = provider.fetch_grouped_daily(date)?;
    if grouped.is_empty() {
        return Err(RunError::NoMarketData { date });
    }
    let benchmark_bar = grouped
        .get(benchmark_symbol)
        .ok_or_else(|| RunError::MissingBenchmark {
            symbol: benchmark_symbol.to_string(),
            reason: format!("no bar for {date}"),
        })?;
    match config.compaction.append(&mut history.benchmark, *benchmark_bar) {
        AppendOutcome::Appended => {
            info!(symbol = benchmark_symbol, %date, "benchmark extended");
        }
        AppendOutcome::Duplicate => {
            info!(symbol = benchmark_symbol, %date, "benchmark already current");
        }
        AppendOutcome::OutOfOrder => {
            warn!(symbol = benchmark_symbol, %date, "benchmark history is newer than target date");
        }
    }

    phases.enter(RunPhase::PerInstrumentLoop);
    let progress = phases.progress();
    let total = history.instruments.len();
    let mut stats = RunStats::default();
    let mut scored: Vec<ScoredInstrument> = Vec::new();

    for (i, instrument) in history.instruments.iter_mut().enumerate() {
        progress.on_instrument(&instrument.symbol, i, total);

        let outcome = match grouped.get(&instrument.symbol) {
            None => InstrumentOutcome::NoBar,
            Some(bar) => extend_and_score(
                instrument,
                *bar,
                &history.benchmark,
                &config.compaction,
                now,
                &mut stats,
                &mut scored,
            ),
        };

        stats.record(&outcome);
        progress.on_instrument_done(&instrument.symbol, &outcome);
    }
    progress.on_loop_complete(&stats);

    if scored.is_empty() {
        return Err(RunError::NoSurvivors);
    }

    phases.enter(RunPhase::Ranking);
    let records = rank(scored)?;

    phases.enter(RunPhase::Persisting);
    let rankings = RankingsArtifact::from_records(
        &records,
        formula_description(&config.benchmark.name),
        config.benchmark.label(),
        UpdateType::DailyIncremental,
        Some(date),
        now,
    );
    history.last_updated = now;

    rankings.save(&config.paths.rankings)?;
    history.save(&config.paths.history)?;
    info!(ranked = rankings.total_stocks, %date, "daily update written");

    Ok(RunReport {
        update_type: UpdateType::DailyIncremental,
        data_date: Some(date),
        stats,
        rankings,
    })
}

/// Calendar coverage of the 3m and 12m offsets over stored bars.
fn horizon_coverage(bars: &[Bar]) -> Vec<(Horizon, Option<OffsetSpan>)> {
    [Horizon::ThreeMonth, Horizon::TwelveMonth]
        .into_iter()
        .map(|h| (h, offset_span(bars, h.trading_days())))
        .collect()
}

/// Append the target bar to one stored history and re-score it.
///
/// A bar that is already stored leaves the history as is but still scores
/// it, so a rerun for the same date reproduces the same ranking.
fn extend_and_score(
    instrument: &mut InstrumentHistory,
    bar: Bar,
    benchmark: &[Bar],
    policy: &CompactionPolicy,
    now: NaiveDateTime,
    stats: &mut RunStats,
    scored: &mut Vec<ScoredInstrument>,
) -> InstrumentOutcome {
    match policy.append(&mut instrument.bars, bar) {
        AppendOutcome::Appended => instrument.last_updated = now,
        AppendOutcome::Duplicate => stats.already_current += 1,
        AppendOutcome::OutOfOrder => {
            debug!(symbol = %instrument.symbol, "stored history is newer than target bar");
            return InstrumentOutcome::OutOfOrder;
        }
    }

    match evaluate_instrument(&instrument.symbol, &instrument.bars, benchmark) {
        Ok(s) => {
            let rs_score = s.rs_score;
            scored.push(s);
            InstrumentOutcome::Scored { rs_score }
        }
        Err(e) => {
            debug!(symbol = %instrument.symbol, reason = %e, "dropped");
            InstrumentOutcome::Insufficient {
                reason: e.to_string(),
            }
        }
    }
}
