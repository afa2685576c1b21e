//! Full rebuild: fetch about a year of bars for the whole universe, score,
//! rank, and write both artifacts from scratch.

use crate::calendar::rebuild_window;
use crate::config::RunConfig;
use crate::progress::RunProgress;
use crate::run::{InstrumentOutcome, PhaseTracker, RunError, RunPhase, RunReport, RunStats};
use chrono::NaiveDateTime;
use rsrank_core::artifacts::{HistoryArtifact, RankingsArtifact, UpdateType};
use rsrank_core::data::{filter_universe, MarketDataProvider};
use rsrank_core::domain::{Bar, InstrumentHistory};
use rsrank_core::engine::{evaluate_instrument, formula_description, rank, ScoredInstrument};
use tracing::{debug, info, warn};

/// Run a full rebuild as of `now`.
///
/// Only instruments that score successfully end up in either artifact.
/// Any error returned here means nothing was written.
pub fn run_full_rebuild(
    provider: &dyn MarketDataProvider,
    config: &RunConfig,
    progress: &dyn RunProgress,
    now: NaiveDateTime,
) -> Result<RunReport, RunError> {
    let mut phases = PhaseTracker::new(progress);
    let result = rebuild(provider, config, &mut phases, now);
    phases.finish(result)
}

fn rebuild(
    provider: &dyn MarketDataProvider,
    config: &RunConfig,
    phases: &mut PhaseTracker<'_>,
    now: NaiveDateTime,
) -> Result<RunReport, RunError> {
    let (start, end) = rebuild_window(now.date(), config.lookback_days);
    let benchmark_symbol = config.benchmark.symbol.as_str();
    info!(provider = provider.name(), %start, %end, "starting full rebuild");

    phases.enter(RunPhase::FetchingBenchmark);
    let benchmark = provider
        .fetch_daily_bars(benchmark_symbol, start, end)
        .map_err(|e| RunError::MissingBenchmark {
            symbol: benchmark_symbol.to_string(),
            reason: e.to_string(),
        })?;
    if benchmark.is_empty() {
        return Err(RunError::MissingBenchmark {
            symbol: benchmark_symbol.to_string(),
            reason: "provider returned no bars".into(),
        });
    }
    info!(symbol = benchmark_symbol, bars = benchmark.len(), "benchmark loaded");

    phases.enter(RunPhase::FetchingUniverse);
    let listed = provider.list_tickers()?;
    let universe = filter_universe(listed.iter().map(String::as_str));
    info!(
        listed = listed.len(),
        tradable = universe.len(),
        "universe filtered"
    );

    phases.enter(RunPhase::PerInstrumentLoop);
    let progress = phases.progress();
    let mut stats = RunStats::default();
    let mut scored: Vec<ScoredInstrument> = Vec::new();
    let mut histories: Vec<InstrumentHistory> = Vec::new();

    for (i, symbol) in universe.iter().enumerate() {
        progress.on_instrument(symbol, i, universe.len());

        let outcome = match provider.fetch_daily_bars(symbol, start, end) {
            Err(e) if e.is_not_found() => {
                debug!(%symbol, "not found upstream");
                InstrumentOutcome::NotFound
            }
            Err(e) => {
                warn!(%symbol, error = %e, "fetch failed");
                InstrumentOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Ok(bars) => score_fresh(
                symbol,
                &bars,
                &benchmark,
                config,
                now,
                &mut scored,
                &mut histories,
            ),
        };

        stats.record(&outcome);
        progress.on_instrument_done(symbol, &outcome);
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
        UpdateType::FullRebuild,
        None,
        now,
    );
    let mut history = HistoryArtifact::new(config.compaction.compact(&benchmark), histories, now);

    rankings.save(&config.paths.rankings)?;
    history.save(&config.paths.history)?;
    info!(
        ranked = rankings.total_stocks,
        rankings = %config.paths.rankings.display(),
        history = %config.paths.history.display(),
        "artifacts written"
    );

    Ok(RunReport {
        update_type: UpdateType::FullRebuild,
        data_date: None,
        stats,
        rankings,
    })
}

/// Check raw coverage, evaluate, and on success keep both the score and the
/// compacted history.
fn score_fresh(
    symbol: &str,
    bars: &[Bar],
    benchmark: &[Bar],
    config: &RunConfig,
    now: NaiveDateTime,
    scored: &mut Vec<ScoredInstrument>,
    histories: &mut Vec<InstrumentHistory>,
) -> InstrumentOutcome {
    if bars.len() <= config.min_raw_bars {
        debug!(%symbol, bars = bars.len(), "too few raw bars");
        return InstrumentOutcome::Insufficient {
            reason: format!("{} raw bars, need more than {}", bars.len(), config.min_raw_bars),
        };
    }

    match evaluate_instrument(symbol, bars, benchmark) {
        Ok(s) => {
            let rs_score = s.rs_score;
            scored.push(s);
            histories.push(InstrumentHistory::new(
                symbol,
                config.compaction.compact(bars),
                now,
            ));
            InstrumentOutcome::Scored { rs_score }
        }
        Err(e) => {
            debug!(%symbol, reason = %e, "dropped");
            InstrumentOutcome::Insufficient {
                reason: e.to_string(),
            }
        }
    }
}
