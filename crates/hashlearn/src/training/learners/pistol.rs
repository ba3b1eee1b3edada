//! Parameter-free stochastic learning (PiSTOL), per coordinate.

use super::{Learner, WeightCache};
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

/// Lipschitz constant assumed for the normalized gradients.
const LIPSCHITZ: f64 = 1.0;

/// PiSTOL with an exponential potential on each coordinate.
///
/// `w_i = η·θ_i·q_i·sqrt(Σ|g·x_i|)·exp(q_i·θ_i²/2)` with
/// `q_i = 1 / (2·s_i·L·(Σ|g·x_i| + s_i·L))`, where `s_i` is the largest
/// `|x_i|` seen so far. Coordinates with `θ_i = 0` have zero weight.
#[derive(Debug, Clone)]
pub struct PerCoordinatePistol {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) eta: f64,
    pub(crate) theta: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    pub(crate) sum_abs_grads: Vec<f64>,
    pub(crate) iteration: u64,
    pub(crate) cache: WeightCache,
}

impl PerCoordinatePistol {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        Self {
            bits,
            loss: Loss::default(),
            eta: 1.0,
            theta: vec![0.0; size],
            scale: vec![0.0; size],
            sum_abs_grads: vec![0.0; size],
            iteration: 0,
            cache: WeightCache::default(),
        }
    }

    #[inline]
    fn coordinate_weight(&self, i: usize) -> f64 {
        let theta = self.theta[i];
        if theta == 0.0 {
            return 0.0;
        }
        let scale = self.scale[i];
        let sum_abs = self.sum_abs_grads[i];
        let q = 0.5 / (scale * LIPSCHITZ * (sum_abs + scale * LIPSCHITZ));
        self.eta * theta * q * sum_abs.sqrt() * (0.5 * q * theta * theta).exp()
    }
}

impl Learner for PerCoordinatePistol {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.iteration += 1;

        let mut pred = 0.0;
        for (index, x) in sample.features.iter() {
            if x == 0.0 {
                continue;
            }
            let i = index as usize;
            self.scale[i] = self.scale[i].max(x.abs());
            pred += self.coordinate_weight(i) * x;
        }

        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);
        for (index, x) in sample.features.iter() {
            let i = index as usize;
            self.theta[i] += x * g;
            self.sum_abs_grads[i] += (x * g).abs();
        }
        pred
    }

    fn predict(&self, sample: &Sample) -> f64 {
        sample
            .features
            .iter()
            .filter(|&(_, x)| x != 0.0)
            .map(|(index, x)| self.coordinate_weight(index as usize) * x)
            .sum()
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
        self.cache.invalidate();
    }

    fn weights(&mut self) -> SparseVector {
        if self.cache.is_stale(self.iteration) {
            let weights = (0..self.theta.len())
                .map(|i| (i as u32, self.coordinate_weight(i)))
                .filter(|&(_, w)| w != 0.0)
                .collect();
            self.cache.store(self.iteration, weights);
        }
        self.cache.weights().clone()
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn headline(&self) -> &'static str {
        "Using PiSTOL optimizer (Adaptive)"
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
    fn first_update_has_no_weight() {
        let mut learner = PerCoordinatePistol::new(3);
        let s = sample(1.0, &[(0, 1.0)]);
        assert_eq!(learner.update(&s), 0.0);
        assert_abs_diff_eq!(learner.theta[0], 2.0);
        assert_abs_diff_eq!(learner.sum_abs_grads[0], 2.0);
    }

    #[test]
    fn weight_formula() {
        let mut learner = PerCoordinatePistol::new(3);
        learner.update(&sample(1.0, &[(0, 1.0)]));
        // θ = 2, Σ = 2, s = 1: q = 0.5 / 3, w = q·2·√2·exp(q·2).
        let q = 0.5 / 3.0;
        let expected = 2.0 * q * 2f64.sqrt() * (2.0 * q).exp();
        assert_abs_diff_eq!(learner.predict(&sample(1.0, &[(0, 1.0)])), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.weights().get(0), expected, epsilon = 1e-12);
    }

    #[test]
    fn weights_cache_refreshes_after_update() {
        let mut learner = PerCoordinatePistol::new(3);
        let s = sample(1.0, &[(1, 1.0)]);
        learner.update(&s);
        let first = learner.weights();
        learner.update(&s);
        let second = learner.weights();
        assert_ne!(first.get(1), second.get(1));
        assert_abs_diff_eq!(second.get(1), learner.predict(&s), epsilon = 1e-15);
    }
}
