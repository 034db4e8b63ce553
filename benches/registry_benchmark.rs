use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinder::{ClassifierRegistry, TrainingDocument};
use tokio::runtime::Runtime;

fn training_set(size: usize) -> Vec<TrainingDocument> {
    let topics = [
        ("tech", "new software release for quantum computing"),
        ("sports", "championship game victory in overtime"),
        ("business", "stock market rally after earnings report"),
    ];
    (0..size)
        .map(|i| {
            let (label, text) = topics[i % topics.len()];
            TrainingDocument::new(format!("{} number {}", text, i), label)
        })
        .collect()
}

fn setup_registry(runtime: &Runtime) -> ClassifierRegistry {
    let registry = ClassifierRegistry::new();
    runtime.block_on(async {
        registry.create_classifier("news").await.unwrap();
        registry.train(training_set(300), "news").await.unwrap();
    });
    registry
}

fn bench_classify(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let registry = setup_registry(&runtime);
    let mut group = c.benchmark_group("Classify");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("best_label", |b| b.iter(|| {
        runtime.block_on(registry.classify(black_box("AI startup stock surges"), "news")).unwrap()
    }));

    group.bench_function("details", |b| b.iter(|| {
        runtime.block_on(registry.classify_details(black_box("AI startup stock surges"), "news")).unwrap()
    }));

    group.finish();
}

fn bench_retrain(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let registry = setup_registry(&runtime);
    let mut group = c.benchmark_group("Retrain");
    group.sample_size(20);

    for size in [30, 300, 3000] {
        let documents = training_set(size);
        group.bench_function(format!("{}_documents", size), |b| b.iter(|| {
            runtime.block_on(registry.train(black_box(documents.clone()), "news")).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_retrain);
criterion_main!(benches);
