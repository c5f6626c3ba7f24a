use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use property_estimator::data::{PropertyFeatures, TrainingSet};
use property_estimator::pipeline::PricePipeline;
use property_estimator::training::TrainingConfig;
use rand::prelude::*;

const LOCATIONS: [&str; 5] = ["Downtown", "Suburb", "Rural", "Harbour", "Hills"];
const AMENITIES: [&str; 4] = ["pool", "gym", "garden", "none"];

fn create_listings(n_rows: usize) -> (Vec<PropertyFeatures>, Vec<f64>) {
    let mut rng = rand::thread_rng();

    let features: Vec<PropertyFeatures> = (0..n_rows)
        .map(|_| {
            PropertyFeatures::new(
                *LOCATIONS.choose(&mut rng).unwrap(),
                rng.gen_range(500.0..3000.0),
                rng.gen_range(1..6),
                rng.gen_range(1..4),
                *AMENITIES.choose(&mut rng).unwrap(),
            )
        })
        .collect();

    // Price grows with size and rooms, plus noise
    let prices = features
        .iter()
        .map(|f| {
            50_000.0 + f.size_sqft * 150.0 + f.bedrooms as f64 * 10_000.0 + rng.gen::<f64>() * 5_000.0
        })
        .collect();

    (features, prices)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 2000, 5000].iter() {
        let (features, prices) = create_listings(*n_rows);
        let set = TrainingSet::new(features, prices).unwrap();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &set, |b, set| {
            b.iter(|| PricePipeline::default().fit(black_box(set)).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let (features, prices) = create_listings(2000);
    let set = TrainingSet::new(features, prices).unwrap();
    let fitted = PricePipeline::new(TrainingConfig::default()).fit(&set).unwrap();

    for n_rows in [1, 100, 1000].iter() {
        let (rows, _) = create_listings(*n_rows);

        group.bench_with_input(BenchmarkId::new("predict", n_rows), &rows, |b, rows| {
            b.iter(|| fitted.predict(black_box(rows)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
