//! Criterion benchmarks for the simulator hot paths.
//!
//! 1. Indicator pass (SMA and EMA over a long series)
//! 2. Daily walk over several years of candles
//! 3. Intraday walk over a month of five-minute sessions

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fnoscan_core::{
    compute_averages, simulate, Candle, Interval, MaKind, MaParams, Series, SimulationMode,
    SimulatorConfig,
};

fn make_series(n: usize, per_day: usize, interval: Interval) -> Series {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let candles = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05).sin() * 10.0 + i as f64 * 0.01;
            let day = base + Duration::days((i / per_day) as i64);
            Candle {
                timestamp: day.and_hms_opt(9, 15, 0).unwrap()
                    + Duration::minutes(5 * (i % per_day) as i64),
                open: close - 0.3,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            }
        })
        .collect();
    Series::new("BENCH", interval, candles).unwrap()
}

fn bench_indicators(c: &mut Criterion) {
    let series = make_series(10_000, 1, Interval::Day1);
    let mut group = c.benchmark_group("compute_averages");
    for kind in [MaKind::Simple, MaKind::Exponential] {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            b.iter(|| compute_averages(black_box(&series), 20, 50, kind))
        });
    }
    group.finish();
}

fn bench_daily(c: &mut Criterion) {
    let series = make_series(1_500, 1, Interval::Day1);
    let config = SimulatorConfig::new(MaParams::default());
    c.bench_function("simulate_daily_1500", |b| {
        b.iter(|| simulate(black_box(&series), SimulationMode::Daily, &config))
    });
}

fn bench_intraday(c: &mut Criterion) {
    let series = make_series(75 * 22, 75, Interval::Minute5);
    let config = SimulatorConfig::new(MaParams::default());
    c.bench_function("simulate_intraday_22_sessions", |b| {
        b.iter(|| simulate(black_box(&series), SimulationMode::Intraday, &config))
    });
}

criterion_group!(benches, bench_indicators, bench_daily, bench_intraday);
criterion_main!(benches);
