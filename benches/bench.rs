// Criterion benchmarks for Arrow Match

use arrow_match::core::{compute_baseline, select_specification, ArrowMatchingEngine, SpineCalculationService};
use arrow_match::models::{
    ArcherProfile, ArrowProduct, BowConfiguration, BowType, MatchRequest, SpineSpecification,
};
use arrow_match::services::{CalculationConfigProvider, InMemoryCatalog, InMemoryConfigStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

const MANUFACTURERS: [&str; 4] = ["Easton Archery", "Gold Tip", "Victory Archery", "Skylon"];

fn create_product(id: usize) -> ArrowProduct {
    let start = 250 + (id % 8) as u32 * 50;
    let specs = (0..6)
        .map(|step| {
            let spine = start + step * 100;
            SpineSpecification::new(spine, 0.230 + (step as f64) * 0.004, 10.5 - step as f64)
        })
        .collect();

    ArrowProduct::new(
        id as u64,
        MANUFACTURERS[id % MANUFACTURERS.len()],
        format!("Model {}", id),
        if id % 5 == 0 { "Aluminum" } else { "Carbon" },
        specs,
    )
    .unwrap()
}

fn create_provider() -> Arc<CalculationConfigProvider> {
    Arc::new(CalculationConfigProvider::with_store(Arc::new(
        InMemoryConfigStore::with_defaults(),
    )))
}

fn create_request() -> MatchRequest {
    let bow = BowConfiguration::new(50.0, 28.0, BowType::Compound);
    MatchRequest::new(ArcherProfile::new("Bench Archer", bow), 28.0)
}

fn bench_baseline(c: &mut Criterion) {
    c.bench_function("compute_baseline", |b| {
        b.iter(|| compute_baseline(black_box(50.0), black_box(28.0), black_box(125.0)));
    });
}

fn bench_spine_calculation(c: &mut Criterion) {
    let service = SpineCalculationService::new(create_provider());

    c.bench_function("spine_calculation_cached", |b| {
        b.iter(|| {
            service.calculate(
                black_box(45.0),
                black_box(29.0),
                black_box(100.0),
                BowType::Recurve,
                Some("olympic"),
                Some("carbon"),
            )
        });
    });
}

fn bench_select_specification(c: &mut Criterion) {
    let product = create_product(3);

    c.bench_function("select_specification", |b| {
        b.iter(|| {
            select_specification(
                black_box(product.spine_specifications()),
                black_box(612.5),
                black_box(0.246),
            )
        });
    });
}

fn bench_matching(c: &mut Criterion) {
    let provider = create_provider();
    let request = create_request();
    let calculation = SpineCalculationService::new(provider.clone())
        .calculate_for_request(&request)
        .unwrap();

    let mut group = c.benchmark_group("matching");

    for product_count in [10, 50, 100, 500, 1000].iter() {
        let catalog = InMemoryCatalog::from_products((0..*product_count).map(create_product)).unwrap();
        let engine = ArrowMatchingEngine::new(Arc::new(catalog), provider.clone())
            .with_search_limit(*product_count);

        group.bench_with_input(
            BenchmarkId::new("find_matches", product_count),
            product_count,
            |b, _| {
                b.iter(|| engine.find_matches(black_box(&request), black_box(&calculation)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_baseline,
    bench_spine_calculation,
    bench_select_specification,
    bench_matching
);

criterion_main!(benches);
