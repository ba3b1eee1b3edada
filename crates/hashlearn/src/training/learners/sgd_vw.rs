//! Normalized adaptive SGD, as popularized by Vowpal Wabbit.

use super::Learner;
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

/// Gradients with a smaller magnitude are not applied.
const MIN_GRADIENT: f64 = 1e-8;

/// Adaptive, scale-normalized SGD.
///
/// Each feature keeps the largest magnitude it has been seen with. When a
/// larger value shows up, the weight is shrunk to keep its contribution
/// constant. Steps are scaled by the per-feature AdaGrad accumulator and by
/// `sqrt(t / N)`, where `N` counts normalized feature mass.
#[derive(Debug, Clone)]
pub struct SgdVw {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) eta: f64,
    pub(crate) weights: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    pub(crate) sum_sq_grads: Vec<f64>,
    pub(crate) normalizer: f64,
    pub(crate) iteration: u64,
}

impl SgdVw {
    pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        Self {
            bits,
            loss: Loss::default(),
            eta: Self::DEFAULT_LEARNING_RATE,
            weights: vec![0.0; size],
            scale: vec![0.0; size],
            sum_sq_grads: vec![0.0; size],
            normalizer: 0.0,
            iteration: 0,
        }
    }
}

impl Learner for SgdVw {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.iteration += 1;

        let mut pred = 0.0;
        for (index, x) in sample.features.iter() {
            if x == 0.0 {
                continue;
            }
            let i = index as usize;
            let abs_x = x.abs();
            if abs_x > self.scale[i] {
                self.weights[i] *= self.scale[i] / abs_x;
                self.scale[i] = abs_x;
                self.normalizer += 1.0;
            } else {
                self.normalizer += (x * x) / (self.scale[i] * self.scale[i]);
            }
            pred += self.weights[i] * x;
        }

        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);
        if g.abs() > MIN_GRADIENT && self.normalizer > 0.0 {
            let step = self.eta * (self.iteration as f64 / self.normalizer).sqrt() * g;
            for (index, x) in sample.features.iter() {
                if x == 0.0 {
                    continue;
                }
                let i = index as usize;
                self.sum_sq_grads[i] += g * g * x * x;
                self.weights[i] += step * (1.0 / self.sum_sq_grads[i]).sqrt() / self.scale[i] * x;
            }
        }

        pred
    }

    fn predict(&self, sample: &Sample) -> f64 {
        sample.features.dot_dense(&self.weights)
    }

    fn loss(&self) -> Loss {
        self.loss
    }

    fn set_loss(&mut self, loss: Loss) {
        self.loss = loss;
    }

    fn learning_rate(&self) -> f64 {
        self.eta
    }

    fn set_learning_rate(&mut self, eta: f64) {
        self.eta = eta;
    }

    fn weights(&mut self) -> SparseVector {
        SparseVector::from_dense(&self.weights)
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn headline(&self) -> &'static str {
        "Using VW optimizer (adaptive and normalized)"
    }
}
