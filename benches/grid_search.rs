//! Benchmarks for the ARIMA / SARIMAX order search and the ADF analysis.

use country_forecast::config::{OrderRange, SearchConfig};
use country_forecast::core::Series;
use country_forecast::models::arima::search;
use country_forecast::validation::analyze;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_series(n: usize, seed: u64) -> Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut level = 100.0;
    let values: Vec<f64> = (0..n)
        .map(|_| {
            level += 0.8 + rng.gen_range(-2.0..2.0);
            level
        })
        .collect();
    Series::from_consecutive(1960, &values)
}

fn bench_arima_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("arima_search");

    for size in [30, 60, 120].iter() {
        let series = generate_series(*size, 42);

        group.bench_with_input(BenchmarkId::new("default_grid", size), size, |b, _| {
            let config = SearchConfig::default();
            b.iter(|| search(black_box(&series), &config))
        });

        group.bench_with_input(BenchmarkId::new("wide_grid", size), size, |b, _| {
            let config = SearchConfig::default().with_orders(
                OrderRange::new(0, 3),
                OrderRange::new(0, 2),
                OrderRange::new(0, 3),
            );
            b.iter(|| search(black_box(&series), &config))
        });
    }

    group.finish();
}

fn bench_sarimax_search(c: &mut Criterion) {
    let series = generate_series(60, 7);
    let config = SearchConfig::default().with_seasonal_period(11);

    c.bench_function("sarimax_search_60", |b| {
        b.iter(|| search(black_box(&series), &config))
    });
}

fn bench_stationarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("stationarity");

    for size in [50, 200].iter() {
        let values = generate_series(*size, 3).values();
        group.bench_with_input(BenchmarkId::new("analyze", size), size, |b, _| {
            b.iter(|| analyze(black_box(&values), 2))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_arima_search, bench_sarimax_search, bench_stationarity);
criterion_main!(benches);
