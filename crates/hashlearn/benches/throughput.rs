//! Parse and update throughput.
//!
//! Run with: `cargo bench --bench throughput`

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use hashlearn::parser::{InstanceParser, VwParser, parse_batch};
use hashlearn::testing::{random_binary_samples, random_vw_lines};
use hashlearn::{Algorithm, LearnerConfig, Loss, OnlineModel, Parallelism};

const BITS: u32 = 18;

fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .sample_size(10)
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse/vw");
    let lines = random_vw_lines(10_000, 20, 100_000, 42);
    let parser = VwParser::new(BITS, None);
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("sequential_lines", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(parser.parse(black_box(line)).ok());
            }
        })
    });
    for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
        group.bench_with_input(
            BenchmarkId::new("batch", format!("{parallelism:?}")),
            &parallelism,
            |b, &parallelism| b.iter(|| black_box(parse_batch(&parser, &lines, parallelism))),
        );
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let samples = random_binary_samples(10_000, BITS, 20, 0.05, 7);
    group.throughput(Throughput::Elements(samples.len() as u64));

    for algorithm in Algorithm::ALL {
        let config = LearnerConfig::builder()
            .algorithm(algorithm)
            .loss(Loss::logistic())
            .bits(BITS)
            .build()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &config, |b, config| {
            let mut model = OnlineModel::new(config.clone()).unwrap();
            b.iter(|| {
                for sample in &samples {
                    black_box(model.learn(sample));
                }
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_parse, bench_update
}
criterion_main!(benches);
