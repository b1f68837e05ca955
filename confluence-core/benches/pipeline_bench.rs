//! Criterion benchmarks for the signal pipeline.
//!
//! Benchmarks:
//! 1. Full pipeline over intraday series of increasing length
//! 2. Each detector on its own
//! 3. Lagged Donchian channel against window length

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use confluence_core::detectors::{
    BreakoutDetector, Detector, MaCrossoverDetector, OpeningRangeDetector,
};
use confluence_core::indicators::{Donchian, Indicator};
use confluence_core::{Bar, BarSeries, Interval, Pipeline, SignalParams};

// ── Helpers ──────────────────────────────────────────────────────────

/// 5-minute bars, 78 per session, one session per calendar day.
fn make_bars(n: usize) -> Vec<Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05).sin() * 10.0;
            let open = close - 0.3;
            let day = (i / 78) as i64;
            let slot = (i % 78) as i64;
            Bar {
                timestamp: start
                    + chrono::Duration::days(day)
                    + chrono::Duration::minutes(5 * slot),
                open,
                high: close + 1.5,
                low: open - 1.5,
                close,
                volume: 10_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

fn make_series(n: usize) -> BarSeries {
    BarSeries::new("BENCH", Interval::FiveMinutes, make_bars(n)).unwrap()
}

// ── 1. Full pipeline ─────────────────────────────────────────────────

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = Pipeline::new(SignalParams::default()).unwrap();

    // ~1 week, ~3 months, ~1 year of 5-minute sessions
    for &bar_count in &[390, 4_914, 19_656] {
        let series = make_series(bar_count);
        group.bench_with_input(
            BenchmarkId::new("default_params", bar_count),
            &series,
            |b, series| {
                b.iter(|| pipeline.run(black_box(series)));
            },
        );
    }

    group.finish();
}

// ── 2. Detectors ─────────────────────────────────────────────────────

fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detectors");
    let bars = make_bars(19_656);

    let breakout = BreakoutDetector::new(20).unwrap();
    group.bench_function("breakout_20", |b| {
        b.iter(|| breakout.detect(black_box(&bars)));
    });

    let ma = MaCrossoverDetector::new(5, 25).unwrap();
    group.bench_function("ma_crossover_5_25", |b| {
        b.iter(|| ma.detect(black_box(&bars)));
    });

    let opening_range = OpeningRangeDetector::new(30).unwrap();
    group.bench_function("opening_range_30", |b| {
        b.iter(|| opening_range.detect(black_box(&bars)));
    });

    group.finish();
}

// ── 3. Donchian window length ────────────────────────────────────────

fn bench_donchian(c: &mut Criterion) {
    let mut group = c.benchmark_group("donchian_lagged");
    let bars = make_bars(19_656);

    for &period in &[20, 100, 500] {
        let upper = Donchian::upper(period).lagged();
        group.bench_with_input(BenchmarkId::from_parameter(period), &period, |b, _| {
            b.iter(|| upper.compute(black_box(&bars)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_detectors, bench_donchian);
criterion_main!(benches);
