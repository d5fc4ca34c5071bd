use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;

use aakr::dataset::Dataset;
use aakr::model::{Aakr, AakrConfig, Weighting};

fn synthetic(nrows: usize, nfeatures: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let pairs: Vec<(String, Vec<f64>)> = (0..nfeatures)
        .map(|j| {
            let col = (0..nrows)
                .map(|i| (i as f64 * 0.1 + j as f64).sin() + rng.random::<f64>() * 0.05)
                .collect();
            (format!("s{j:03}"), col)
        })
        .collect();
    Dataset::from_columns(pairs).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    group.measurement_time(Duration::from_secs(10));

    for &nrows in &[200usize, 1000] {
        let x = synthetic(nrows, 50, 1);
        let y = synthetic(20, 50, 2);

        for weighting in [Weighting::Euclidean, Weighting::RankPermutation] {
            let mut model = Aakr::new(AakrConfig::new(5.0, weighting).unwrap());
            let (xt, yt) = model.fit_transform(&x, &y).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{weighting:?}"), nrows),
                &nrows,
                |b, _| {
                    b.iter(|| {
                        let (_, recon) = model.predict(black_box(&xt), black_box(&yt)).unwrap();
                        black_box(recon)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
