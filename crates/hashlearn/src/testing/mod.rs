//! Deterministic synthetic sample streams for tests and benchmarks.

use rand::prelude::*;

use crate::data::{BIAS_INDEX, Sample, SparseVector};
use crate::hashing::table_size;

/// Bias-only sample with the given label.
pub fn bias_sample(label: f64) -> Sample {
    let mut sample = Sample::new(label, SparseVector::with_capacity(1));
    sample.push_bias();
    sample
}

/// `n` bias-only samples: positive when `i % 5 == 0`, negative otherwise.
///
/// The optimal constant predictor on this stream is `ln(1/4)`.
pub fn alternating_stream(n: usize) -> impl Iterator<Item = Sample> {
    let positive = bias_sample(1.0);
    let negative = bias_sample(-1.0);
    (0..n).map(move |i| if i % 5 == 0 { positive.clone() } else { negative.clone() })
}

/// Random sparse binary-classification samples.
///
/// Each sample carries the bias plus `density` random features drawn from a
/// table of `2^bits` entries, with values uniform in `[-1, 1]`. Labels are the
/// sign of a hidden linear model, flipped with probability `noise`.
pub fn random_binary_samples(n: usize, bits: u32, density: usize, noise: f64, seed: u64) -> Vec<Sample> {
    assert!((0.0..=1.0).contains(&noise));
    let size = table_size(bits);
    let mut rng = StdRng::seed_from_u64(seed);
    let hidden: Vec<f64> = (0..size).map(|_| rng.gen_range(-1.0..1.0)).collect();

    (0..n)
        .map(|_| {
            let mut features = SparseVector::with_capacity(density + 1);
            for _ in 0..density {
                let index = rng.gen_range(0..size) as u32;
                if index != BIAS_INDEX {
                    features.put(index, rng.gen_range(-1.0..1.0));
                }
            }
            let mut sample = Sample::new(0.0, features);
            sample.push_bias();

            let score = sample.features.dot_dense(&hidden);
            let mut label = if score > 0.0 { 1.0 } else { -1.0 };
            if rng.r#gen::<f64>() < noise {
                label = -label;
            }
            sample.label = label;
            sample
        })
        .collect()
}

/// VW-format text lines over `n_tokens` distinct feature names.
pub fn random_vw_lines(n: usize, features_per_line: usize, n_tokens: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let label = if rng.r#gen::<bool>() { "1" } else { "-1" };
            let mut line = format!("{label} 1.0 ex{i}|f");
            for _ in 0..features_per_line {
                let token = rng.gen_range(0..n_tokens);
                let value: f64 = rng.gen_range(0.0..2.0);
                line.push_str(&format!(" t{token}:{value:.3}"));
            }
            line
        })
        .collect()
}
