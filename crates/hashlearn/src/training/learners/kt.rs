//! Krichevsky-Trofimov coin betting, global and per-coordinate.

use super::{Learner, WeightCache};
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

// =============================================================================
// Global KT
// =============================================================================

/// KT bettor on the whole weight vector.
///
/// The bet is `(reward + W) / (t + 1)` times the accumulated gradients,
/// normalized by the largest feature norm seen so far.
#[derive(Debug, Clone)]
pub struct Kt {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) initial_wealth: f64,
    pub(crate) theta: Vec<f64>,
    pub(crate) reward: f64,
    pub(crate) steps: f64,
    pub(crate) max_norm_grad: f64,
}

impl Kt {
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        Self {
            bits,
            loss: Loss::default(),
            initial_wealth: 1.0,
            theta: vec![0.0; table_size(bits)],
            reward: 0.0,
            steps: 0.0,
            max_norm_grad: 0.0,
        }
    }

    /// Factor turning `θ` into weights. Zero until a non-empty sample is seen.
    fn bet_fraction(&self) -> f64 {
        if self.max_norm_grad == 0.0 {
            return 0.0;
        }
        (self.reward + self.initial_wealth) / (self.steps + 1.0) / (self.max_norm_grad * self.max_norm_grad)
    }
}

impl Learner for Kt {
    fn update(&mut self, sample: &Sample) -> f64 {
        let norm = sample.features.squared_l2_norm().sqrt();
        self.max_norm_grad = self.max_norm_grad.max(norm);

        let pred = sample.features.dot_dense(&self.theta) * self.bet_fraction();
        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);

        self.reward += pred * g;
        self.steps += 1.0;
        sample.features.add_scaled_to_dense(&mut self.theta, g);
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
        "Using KT-based optimizer"
    }
}

// =============================================================================
// Per-Coordinate KT
// =============================================================================

/// Independent KT bettor on each coordinate.
///
/// `w_i = (reward_i + W)·θ_i / (n_i + 1) / s_i²`, with `n_i` the number of
/// updates that touched coordinate `i` and `s_i` its largest `|x_i|`.
#[derive(Debug, Clone)]
pub struct PerCoordinateKt {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) initial_wealth: f64,
    pub(crate) reward: Vec<f64>,
    pub(crate) theta: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    pub(crate) steps: Vec<f64>,
    pub(crate) iteration: u64,
    pub(crate) cache: WeightCache,
}

impl PerCoordinateKt {
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
            steps: vec![0.0; size],
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
        (self.reward[i] + self.initial_wealth) * theta / (self.steps[i] + 1.0) / (scale * scale)
    }
}

impl Learner for PerCoordinateKt {
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
            self.steps[i] += 1.0;
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
        "Using KT-based optimizer (Adaptive)"
    }
}
