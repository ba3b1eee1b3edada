//! Continuous coin betting (COCOB), global and per-coordinate.

use super::{Learner, WeightCache, shrink};
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

/// Keeps the bet finite while `θ` is still zero.
const NORM_EPSILON: f64 = 1e-10;

// =============================================================================
// Global COCOB
// =============================================================================

/// COCOB on the whole weight vector.
///
/// The betting fraction `β = shrink(2·G·‖θ‖ / (Σ|g|·‖x‖·G + G² + 1))` is
/// applied to the wealth along the direction of `θ`, where `G` is the
/// largest feature norm seen so far. `‖θ‖²` is maintained incrementally.
#[derive(Debug, Clone)]
pub struct Cocob {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) initial_wealth: f64,
    pub(crate) theta: Vec<f64>,
    pub(crate) reward: f64,
    pub(crate) sum_abs_grad_scale: f64,
    pub(crate) max_norm_grad: f64,
    pub(crate) squared_norm_theta: f64,
}

impl Cocob {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        Self {
            bits,
            loss: Loss::default(),
            initial_wealth: 1.0,
            theta: vec![0.0; table_size(bits)],
            reward: 0.0,
            sum_abs_grad_scale: 0.0,
            max_norm_grad: 0.0,
            squared_norm_theta: 0.0,
        }
    }

    /// Factor turning `θ` into weights.
    fn bet_fraction(&self) -> f64 {
        let max_norm = self.max_norm_grad;
        if max_norm == 0.0 {
            return 0.0;
        }
        let norm_theta = self.squared_norm_theta.max(0.0).sqrt();
        let beta = shrink(2.0 * max_norm * norm_theta / (self.sum_abs_grad_scale + max_norm * max_norm + 1.0));
        beta * (self.reward + self.initial_wealth) / (max_norm * (norm_theta + NORM_EPSILON))
    }
}

impl Learner for Cocob {
    fn update(&mut self, sample: &Sample) -> f64 {
        let squared_norm = sample.features.squared_l2_norm();
        let norm = squared_norm.sqrt();
        self.max_norm_grad = self.max_norm_grad.max(norm);

        let dot = sample.features.dot_dense(&self.theta);
        let pred = dot * self.bet_fraction();
        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);

        self.reward += pred * g;
        self.sum_abs_grad_scale += g.abs() * norm * self.max_norm_grad;
        sample.features.add_scaled_to_dense(&mut self.theta, g);
        self.squared_norm_theta += 2.0 * g * dot + g * g * squared_norm;
        pred
    }

    fn predict(&self, sample: &Sample) -> f64 {
        sample.features.dot_dense(&self.theta) * self.bet_fraction()
    }

    fn loss(&self) -> Loss {
        self.loss
    }

    fn set_loss(&mut self, loss: Loss) {
        self.loss = loss;
    }

    fn learning_rate(&self) -> f64 {
        self.initial_wealth
    }

    fn set_learning_rate(&mut self, eta: f64) {
        self.initial_wealth = eta;
    }

    fn weights(&mut self) -> SparseVector {
        SparseVector::from_dense_scaled(&self.theta, self.bet_fraction())
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn headline(&self) -> &'static str {
        "Using Continuous Coin Betting optimizer"
    }
}

// =============================================================================
// Per-Coordinate COCOB
// =============================================================================

/// Independent COCOB bettor on each coordinate.
///
/// `w_i = β_i·(reward_i + W) / s_i` with
/// `β_i = shrink(2·θ_i·s_i / (Σ|g·x_i|·s_i + 1 + s_i))`.
#[derive(Debug, Clone)]
pub struct PerCoordinateCocob {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) initial_wealth: f64,
    pub(crate) reward: Vec<f64>,
    pub(crate) theta: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    pub(crate) sum_abs_grads: Vec<f64>,
    pub(crate) iteration: u64,
    pub(crate) cache: WeightCache,
}

impl PerCoordinateCocob {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        Self {
            bits,
            loss: Loss::default(),
            initial_wealth: 1.0,
            reward: vec![0.0; size],
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
        let beta = shrink(2.0 * theta * scale / (self.sum_abs_grads[i] + 1.0 + scale));
        beta * (self.reward[i] + self.initial_wealth) / scale
    }
}

impl Learner for PerCoordinateCocob {
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
            if x == 0.0 {
                continue;
            }
            let i = index as usize;
            let w = self.coordinate_weight(i);
            self.reward[i] += w * x * g;
            self.theta[i] += x * g;
            self.sum_abs_grads[i] += (x * g).abs() * self.scale[i];
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
        self.initial_wealth
    }

    fn set_learning_rate(&mut self, eta: f64) {
        self.initial_wealth = eta;
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
        "Using Continuous Coin Betting optimizer (Adaptive)"
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
    fn global_state_after_one_step() {
        let mut learner = Cocob::new(3);
        let s = sample(1.0, &[(0, 1.0), (3, 1.0)]);
        assert_eq!(learner.update(&s), 0.0);
        // g = 2, ‖x‖ = √2: Σ|g|·‖x‖·G = 2·2, ‖θ‖² = 4·2.
        assert_abs_diff_eq!(learner.sum_abs_grad_scale, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.squared_norm_theta, 8.0, epsilon = 1e-12);
        let squared: f64 = learner.theta.iter().map(|t| t * t).sum();
        assert_abs_diff_eq!(learner.squared_norm_theta, squared, epsilon = 1e-12);
    }

    #[test]
    fn global_prediction_formula() {
        let mut learner = Cocob::new(3);
        let s = sample(1.0, &[(0, 1.0)]);
        learner.update(&s);
        // θ = 2, G = 1, Σ = 2: β = shrink(4 / 4), bet = β·1 / (2 + ε).
        let beta = shrink(1.0);
        let expected = 2.0 * beta / (2.0 + NORM_EPSILON);
        assert_abs_diff_eq!(learner.predict(&s), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.weights().get(0), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.update(&s), expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_sample_is_harmless() {
        let mut learner = Cocob::new(2);
        assert_eq!(learner.update(&Sample::default()), 0.0);
        assert!(learner.predict(&Sample::default()).is_finite());
    }

    #[test]
    fn per_coordinate_prediction_formula() {
        let mut learner = PerCoordinateCocob::new(3);
        let s = sample(1.0, &[(5, 2.0)]);
        assert_eq!(learner.update(&s), 0.0);
        // θ = 4, s = 2, Σ = 4·2: β = shrink(16 / 11), w = β / 2.
        let w = shrink(16.0 / 11.0) / 2.0;
        assert_abs_diff_eq!(learner.weights().get(5), w, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.predict(&s), 2.0 * w, epsilon = 1e-12);
    }

    #[test]
    fn unseen_coordinates_have_no_weight() {
        let mut learner = PerCoordinateCocob::new(3);
        learner.update(&sample(1.0, &[(1, 1.0)]));
        let weights = learner.weights();
        assert_eq!(weights.len(), 1);
        assert!(weights.values().iter().all(|w| w.is_finite()));
    }
}
