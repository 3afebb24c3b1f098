use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rocband::{
    Assumption, BandEngine, BandMethod, BootstrapSampler, Kernel, RocCurve, Smoothing,
};

fn random_scores(n: usize, seed: u64) -> (Vec<bool>, Vec<f64>) {
    let mut state = seed;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n)
        .map(|i| {
            let positive = i % 2 == 0;
            let shift = if positive { 0.3 } else { 0.0 };
            (positive, (0.7 * next() + shift).min(0.999))
        })
        .unzip()
}

fn bench_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("curve");

    let (labels, scores) = random_scores(100_000, 42);
    group.bench_function("from_scores_100k_res1000", |b| {
        b.iter(|| RocCurve::from_scores(black_box(&labels), black_box(&scores), 1000))
    });

    let curve = RocCurve::from_scores(&labels, &scores, 1000).unwrap();
    group.bench_function("resample_1000", |b| b.iter(|| black_box(&curve).resample(1000)));

    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");

    let (labels, scores) = random_scores(2_000, 7);
    let curve = RocCurve::from_scores(&labels, &scores, 200).unwrap();
    let kernel = Smoothing::kernel(Kernel::default());
    group.bench_function("kernel_2k_res200", |b| b.iter(|| black_box(&curve).smooth(&kernel)));
    group.bench_function("binormal_res200", |b| {
        b.iter(|| black_box(&curve).smooth(&Smoothing::Binormal))
    });
    group.bench_function("convex_res200", |b| {
        b.iter(|| black_box(&curve).smooth(&Smoothing::Convex))
    });

    group.finish();
}

fn bench_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("bands");

    let (labels, scores) = random_scores(2_000, 11);
    let source = RocCurve::from_scores(&labels, &scores, 100).unwrap();
    let replicates = BootstrapSampler::new(50).unwrap().resample(&source, 3).unwrap();
    let engine = BandEngine::default();

    group.bench_function("bootstrap_50x2k", |b| {
        let sampler = BootstrapSampler::new(50).unwrap();
        b.iter(|| sampler.resample(black_box(&source), 3))
    });
    for (name, method) in [
        ("vertical_50", BandMethod::VerticalAveraging),
        ("threshold_50", BandMethod::ThresholdAveraging),
        ("fixed_width_50", BandMethod::FixedWidth),
        ("ks_50", BandMethod::KolmogorovSmirnov),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| engine.compute(black_box(replicates.curves()), method, 95.0, Assumption::Normal))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_curve, bench_smoothing, bench_bands);
criterion_main!(benches);
