//! Scale-free online learning (SOLO FTRL), global and per-coordinate.

use super::Learner;
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

// =============================================================================
// Global SOLO
// =============================================================================

/// SOLO with one global step size `eta / sqrt(Σ g²‖x‖²)`.
#[derive(Debug, Clone)]
pub struct Solo {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) eta: f64,
    pub(crate) theta: Vec<f64>,
    pub(crate) sum_sq_grads: f64,
    pub(crate) scaling: f64,
    pub(crate) iteration: u64,
}

impl Solo {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        Self {
            bits,
            loss: Loss::default(),
            eta: 1.0,
            theta: vec![0.0; table_size(bits)],
            sum_sq_grads: 1.0,
            scaling: 1.0,
            iteration: 0,
        }
    }
}

impl Learner for Solo {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.iteration += 1;
        let pred = self.predict(sample);
        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);

        sample.features.add_scaled_to_dense(&mut self.theta, g);
        self.sum_sq_grads += sample.features.squared_l2_norm() * g * g;
        self.scaling = self.eta / self.sum_sq_grads.sqrt();
        pred
    }

    fn predict(&self, sample: &Sample) -> f64 {
        sample.features.dot_dense(&self.theta) * self.scaling
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
        SparseVector::from_dense_scaled(&self.theta, self.scaling)
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn headline(&self) -> &'static str {
        "Using SOLO optimizer"
    }
}

// =============================================================================
// Per-Coordinate SOLO
// =============================================================================

/// SOLO with an independent AdaGrad-like step per feature.
#[derive(Debug, Clone)]
pub struct PerCoordinateSolo {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) eta: f64,
    pub(crate) theta: Vec<f64>,
    pub(crate) sum_sq_grads: Vec<f64>,
    pub(crate) weights: Vec<f64>,
    pub(crate) iteration: u64,
}

impl PerCoordinateSolo {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        Self {
            bits,
            loss: Loss::default(),
            eta: 1.0,
            theta: vec![0.0; size],
            sum_sq_grads: vec![0.0; size],
            weights: vec![0.0; size],
            iteration: 0,
        }
    }
}

impl Learner for PerCoordinateSolo {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.iteration += 1;
        let pred = self.predict(sample);
        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);

        for (index, x) in sample.features.iter() {
            if x == 0.0 {
                continue;
            }
            let i = index as usize;
            let gx = g * x;
            self.theta[i] += gx;
            self.sum_sq_grads[i] += gx * gx;
            if self.sum_sq_grads[i] > 0.0 {
                self.weights[i] = self.eta * self.theta[i] / self.sum_sq_grads[i].sqrt();
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
        "Using SOLO optimizer (adaptive)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(label: f64, entries: &[(u32, f64)]) -> Sample {
        Sample::new(label, entries.iter().copied().collect())
    }

    #[test]
    fn global_scaling_follows_gradient_mass() {
        let mut learner = Solo::new(3);
        let s = sample(1.0, &[(0, 1.0), (2, 1.0)]);
        assert_eq!(learner.update(&s), 0.0);
        // g = 2, ‖x‖² = 2: Σ = 1 + 8.
        assert_abs_diff_eq!(learner.sum_sq_grads, 9.0);
        assert_abs_diff_eq!(learner.scaling, 1.0 / 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(learner.predict(&s), 4.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.weights().get(2), 2.0 / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn per_coordinate_weights() {
        let mut learner = PerCoordinateSolo::new(3);
        learner.set_learning_rate(0.5);
        learner.update(&sample(1.0, &[(1, 2.0)]));
        // g = 2, θ = 4, Σ = 16: w = 0.5 · 4 / 4.
        assert_abs_diff_eq!(learner.weights[1], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(learner.predict(&sample(0.0, &[(1, 2.0)])), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn headlines() {
        assert_eq!(Solo::new(2).headline(), "Using SOLO optimizer");
        assert_eq!(PerCoordinateSolo::new(2).headline(), "Using SOLO optimizer (adaptive)");
    }
}
