//! Benchmarks for the Moodline local engine
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use moodline::analytics::*;
use moodline::collaborator::ScriptedGenerator;
use moodline::insights::{assemble, correlation_observations, InsightConfig, InsightEngine};
use std::sync::Arc;

const MOODS: [&str; 8] = ["angry", "sad", "anxious", "neutral", "calm", "happy", "excited", "joyful"];
const QUALITIES: [&str; 4] = ["poor", "fair", "good", "excellent"];

fn create_history(days: usize) -> WellnessHistory {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let date = |i: usize| start + Duration::days(i as i64);

    let mut history = WellnessHistory::from_moods((0..days).map(|i| (date(i), MOODS[(i * 5 + i / 3) % 8])));
    for i in 0..days {
        history = history
            .sleep(date(i), 5.0 + (i % 7) as f64 * 0.5, QUALITIES[i % 4])
            .focus(date(i), (i % 10) as f64 + 1.0, 25 * (i % 5) as i64)
            .xp(date(i), 10 * (i % 12) as i64);
    }
    history
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    for days in [30, 365] {
        let history = create_history(days);

        group.throughput(Throughput::Elements(days as u64));

        group.bench_function(format!("feature_table_{}", days), |b| {
            b.iter(|| FeatureTable::build(black_box(&history)))
        });
    }

    group.finish();
}

fn bench_correlations(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlations");

    for days in [30, 365] {
        let history = create_history(days);
        let x: Vec<f64> = (0..days).map(|i| (i % 7) as f64).collect();
        let y: Vec<f64> = (0..days).map(|i| (i % 5) as f64 * 1.5).collect();

        group.bench_function(format!("pearson_{}", days), |b| {
            b.iter(|| pearson_correlation(black_box(&x), black_box(&y)))
        });

        for alignment in [CorrelationAlignment::Date, CorrelationAlignment::Position] {
            let engine = CorrelationEngine::new(alignment);
            group.bench_function(format!("calculate_all_{:?}_{}", alignment, days), |b| {
                b.iter(|| engine.calculate_all(black_box(&history)))
            });
        }
    }

    group.finish();
}

fn bench_forecast(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecast");

    for days in [30, 365] {
        let table = FeatureTable::build(&create_history(days));

        let regression = Forecaster::new(ForecastStrategy::Regression, None);
        group.bench_function(format!("regression_{}", days), |b| {
            b.iter(|| regression.forecast(black_box(&table)))
        });

        let heuristic = Forecaster::new(ForecastStrategy::Heuristic, Some(42));
        group.bench_function(format!("heuristic_{}", days), |b| {
            b.iter(|| heuristic.forecast(black_box(&table)))
        });
    }

    group.finish();
}

fn bench_recommendations(c: &mut Criterion) {
    let correlations = CorrelationEngine::default().calculate_all(&create_history(60));
    let base = vec![
        "Take an evening walk".to_string(),
        "Maintain regular sleep patterns".to_string(),
        "take an evening walk ".to_string(),
    ];

    c.bench_function("recommendations_assemble", |b| {
        b.iter(|| {
            let observations = correlation_observations(black_box(&correlations), 0.2);
            assemble(black_box(base.clone()), observations)
        })
    });
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let engine = InsightEngine::new(
        Arc::new(ScriptedGenerator::unavailable()),
        InsightConfig::default(),
    );
    let history = create_history(90);

    group.bench_function("generate_offline_90", |b| {
        b.iter(|| {
            rt.block_on(async { engine.generate(black_box(history.clone())).await.unwrap() })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_features,
    bench_correlations,
    bench_forecast,
    bench_recommendations,
    bench_engine
);
criterion_main!(benches);
