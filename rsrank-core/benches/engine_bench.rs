//! Criterion benchmarks for the RS hot path.
//!
//! Benchmarks:
//! 1. Per-instrument evaluation (coverage checks, align, returns, score)
//! 2. Cross-sectional ranking of a full universe
//! 3. History compaction and daily append

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rsrank_core::domain::Bar;
use rsrank_core::engine::{evaluate_instrument, rank, CompactionPolicy, ScoredInstrument};

// ── Helpers ──────────────────────────────────────────────────────────

/// Random-walk daily bars on consecutive calendar days.
fn make_bars(n: usize, seed: u64) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 100.0;
    (0..n)
        .map(|i| {
            close *= 1.0 + rng.gen_range(-0.03..0.03);
            Bar::on_date(
                base_date + chrono::Duration::days(i as i64),
                close,
                rng.gen_range(10_000..5_000_000),
            )
        })
        .collect()
}

fn make_universe(n: usize, bars: usize) -> Vec<(String, Vec<Bar>)> {
    (0..n)
        .map(|i| (format!("SYM{i}"), make_bars(bars, i as u64 + 1)))
        .collect()
}

// ── 1. Evaluation ────────────────────────────────────────────────────

fn bench_evaluate(c: &mut Criterion) {
    let benchmark = make_bars(310, 0);
    let instrument = make_bars(310, 42);

    let mut group = c.benchmark_group("evaluate");
    group.bench_function("single_310_bars", |b| {
        b.iter(|| evaluate_instrument(black_box("SYM"), black_box(&instrument), &benchmark))
    });

    let universe = make_universe(200, 310);
    group.bench_function("universe_200x310", |b| {
        b.iter(|| {
            universe
                .iter()
                .filter_map(|(s, bars)| evaluate_instrument(s, bars, &benchmark).ok())
                .count()
        })
    });
    group.finish();
}

// ── 2. Ranking ───────────────────────────────────────────────────────

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    for n in [500usize, 5_000] {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let scored: Vec<ScoredInstrument> = (0..n)
            .map(|i| ScoredInstrument {
                symbol: format!("S{i}"),
                rs_score: rng.gen_range(-2.0..2.0),
                avg_volume: 1_000_000.0,
                relative: Default::default(),
                raw: Default::default(),
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &scored, |b, s| {
            b.iter(|| rank(black_box(s.clone())))
        });
    }
    group.finish();
}

// ── 3. Compaction ────────────────────────────────────────────────────

fn bench_compaction(c: &mut Criterion) {
    let policy = CompactionPolicy::default();
    let full = make_bars(310, 7);
    let stored = policy.compact(&full);
    let next = make_bars(311, 7)[310];

    let mut group = c.benchmark_group("compaction");
    group.bench_function("compact_310_bars", |b| {
        b.iter(|| policy.compact(black_box(&full)))
    });
    group.bench_function("append_one", |b| {
        b.iter(|| {
            let mut history = stored.clone();
            policy.append(&mut history, black_box(next))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_rank, bench_compaction);
criterion_main!(benches);
