use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use studyplan_core::catalog::build_variant;
use studyplan_core::progress::{compute_progress, recommend_next_courses};
use studyplan_core::risk::{RiskEngine, StudentMetrics};

fn bench_progress(c: &mut Criterion) {
    let mut group = c.benchmark_group("progress");
    let variant = build_variant(&"202301-normal".parse().unwrap()).unwrap();
    let half: HashSet<String> = variant
        .non_placeholder_codes()
        .into_iter()
        .step_by(2)
        .collect();

    group.bench_function("build_variant", |b| {
        let key = "202309-precalc".parse().unwrap();
        b.iter(|| build_variant(black_box(&key)))
    });

    group.bench_function("compute_progress/half", |b| {
        b.iter(|| compute_progress(black_box(&variant), black_box(&half)))
    });

    group.bench_function("recommend_next_courses", |b| {
        b.iter(|| recommend_next_courses(black_box(&variant), black_box(&half), 20))
    });

    group.finish();
}

fn bench_what_if(c: &mut Criterion) {
    let variant = build_variant(&"202301-normal".parse().unwrap()).unwrap();
    let engine = RiskEngine::new(&variant);
    let planned: Vec<String> = ["CSC2104", "SEG2202", "CSC2103", "PRG2104"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let completed: HashSet<String> = ["CSC1024", "PRG1203"].iter().map(|s| s.to_string()).collect();
    let metrics = StudentMetrics {
        cgpa: 3.1,
        attendance: 88.0,
        gpa_trend: 0.1,
        planned_credits: 0.0,
    };

    c.bench_function("what_if/4_courses", |b| {
        b.iter(|| engine.what_if(black_box(&planned), black_box(&metrics), black_box(&completed)))
    });
}

criterion_group!(benches, bench_progress, bench_what_if);
criterion_main!(benches);
