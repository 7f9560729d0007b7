use corpusgraph::algo::{
    betweenness_sampled, label_propagation, page_rank, BetweennessConfig, GraphView,
    LabelPropagationConfig, PageRankConfig,
};
use corpusgraph::persistence::{EntityRow, MentionRow, RelationshipRow};
use corpusgraph::{AnalyticsEngine, Dataset, EngineConfig, MemoryStore};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Sparse random graph with average degree around 8
fn synthetic_view(nodes: u64) -> GraphView {
    let mut rng = StdRng::seed_from_u64(42);
    let ids: Vec<u64> = (0..nodes).collect();
    let edges: Vec<(u64, u64, f64)> = (0..nodes * 4)
        .map(|_| (rng.gen_range(0..nodes), rng.gen_range(0..nodes), 1.0))
        .collect();
    GraphView::from_edges(&ids, &edges)
}

fn synthetic_dataset(entities: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    Dataset {
        entities: (0..entities)
            .map(|i| EntityRow::new(i, &format!("Entity{}", i), "person"))
            .collect(),
        relationships: (0..entities * 2)
            .map(|_| RelationshipRow::new(rng.gen_range(0..entities), rng.gen_range(0..entities), "associate"))
            .collect(),
        mentions: (0..entities * 3)
            .map(|_| MentionRow::new(rng.gen_range(0..entities), rng.gen_range(0..entities / 2)))
            .collect(),
        activities: vec![],
    }
}

fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");

    for size in [1_000u64, 10_000, 50_000].iter() {
        let view = synthetic_view(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| page_rank(&view, &PageRankConfig::default()));
        });
    }
    group.finish();
}

fn bench_betweenness(c: &mut Criterion) {
    let mut group = c.benchmark_group("betweenness_sampled");
    group.sample_size(10);

    let view = synthetic_view(10_000);
    for samples in [50usize, 200, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(samples), samples, |b, &samples| {
            let config = BetweennessConfig { samples, seed: Some(1), parallel: true };
            b.iter(|| betweenness_sampled(&view, &config));
        });
    }
    group.finish();
}

fn bench_label_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_propagation");

    for size in [1_000u64, 10_000].iter() {
        let view = synthetic_view(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| label_propagation(&view, &LabelPropagationConfig::default()));
        });
    }
    group.finish();
}

fn bench_batch_dry_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_all_dry_run");
    group.sample_size(10);

    for size in [1_000u64, 5_000].iter() {
        let store = Arc::new(MemoryStore::with_dataset(synthetic_dataset(*size)));
        let mut config = EngineConfig::default();
        config.compute.sample_seed = Some(3);
        let engine = AnalyticsEngine::new(store.clone(), store, config);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| engine.compute_all(true, 20, 200).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pagerank,
    bench_betweenness,
    bench_label_propagation,
    bench_batch_dry_run
);
criterion_main!(benches);
