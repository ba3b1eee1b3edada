//! Second-order factorization machine trained with AdaGrad.
//!
//! The score is
//!
//! ```text
//! Σ_i w_i·x_i + Σ_f ½·((Σ_i v_{i,f}·x_i)² − Σ_i v_{i,f}²·x_i²)
//! ```
//!
//! which equals the sum of all pairwise `<v_i, v_j>·x_i·x_j` terms in
//! `O(k·n)` for `n` active features and `k` factors.

use ndarray::Array2;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::Learner;
use crate::data::{Sample, SparseVector};
use crate::hashing::{clamp_bits, table_size};
use crate::training::{Loss, LossFn};

/// Factorization machine with per-feature scale normalization.
///
/// Linear weights and factor rows are rescaled by `s_i / |x_i|` whenever a
/// feature shows up with a larger magnitude than before, the same
/// normalization [`SgdVw`](super::SgdVw) applies. Each parameter has its own
/// AdaGrad accumulator; the step is `η / (sqrt(G) + e^-6)`.
#[derive(Debug, Clone)]
pub struct FactorizationMachine {
    pub(crate) bits: u32,
    pub(crate) loss: Loss,
    pub(crate) eta: f64,
    pub(crate) n_factors: usize,
    pub(crate) weights: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    pub(crate) sum_sq_grads: Vec<f64>,
    /// Factor rows, shape `[2^bits, n_factors]`.
    pub(crate) factors: Array2<f64>,
    pub(crate) factor_sum_sq_grads: Array2<f64>,
}

impl FactorizationMachine {
    pub const DEFAULT_LEARNING_RATE: f64 = 0.5;
    /// Standard deviation of the initial factors.
    pub const DEFAULT_INIT_STD: f64 = 0.01;

    /// Create a machine with `n_factors` latent factors per feature, drawn
    /// from `init` with a generator seeded by `seed`.
    pub fn new(bits: u32, n_factors: usize, init: Normal<f64>, seed: u64) -> Self {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let factors = Array2::from_shape_simple_fn((size, n_factors), || init.sample(&mut rng));
        Self {
            bits,
            loss: Loss::default(),
            eta: Self::DEFAULT_LEARNING_RATE,
            n_factors,
            weights: vec![0.0; size],
            scale: vec![0.0; size],
            sum_sq_grads: vec![0.0; size],
            factors,
            factor_sum_sq_grads: Array2::zeros((size, n_factors)),
        }
    }

    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    /// AdaGrad damping term.
    fn epsilon() -> f64 {
        (-6.0f64).exp()
    }

    /// Score `sample`, writing `Σ_i v_{i,f}·x_i` for every factor into `sums`.
    fn score(&self, sample: &Sample, sums: &mut [f64]) -> f64 {
        let mut pred = sample.features.dot_dense(&self.weights);
        for (f, sum) in sums.iter_mut().enumerate() {
            let mut linear = 0.0;
            let mut square = 0.0;
            for (index, x) in sample.features.iter() {
                let prod = self.factors[[index as usize, f]] * x;
                linear += prod;
                square += prod * prod;
            }
            *sum = linear;
            pred += 0.5 * (linear * linear - square);
        }
        pred
    }

    /// Rescale parameters of features seen with a new maximum magnitude.
    fn normalize(&mut self, sample: &Sample) {
        for (index, x) in sample.features.iter() {
            let i = index as usize;
            let abs_x = x.abs();
            if abs_x > self.scale[i] {
                if self.scale[i] > 0.0 {
                    let ratio = self.scale[i] / abs_x;
                    self.weights[i] *= ratio;
                    self.factors.row_mut(i).mapv_inplace(|v| v * ratio);
                }
                self.scale[i] = abs_x;
            }
        }
    }
}

impl Learner for FactorizationMachine {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.normalize(sample);
        let mut sums = vec![0.0; self.n_factors];
        let pred = self.score(sample, &mut sums);

        let g = self.loss.negative_gradient(pred, sample.label, sample.weight);
        let epsilon = Self::epsilon();

        for (index, x) in sample.features.iter() {
            if x == 0.0 {
                continue;
            }
            let i = index as usize;
            let grad = g * x;
            self.sum_sq_grads[i] += grad * grad;
            self.weights[i] += self.eta / (self.sum_sq_grads[i].sqrt() + epsilon) * grad;
        }

        for (f, &sum) in sums.iter().enumerate() {
            for (index, x) in sample.features.iter() {
                if x == 0.0 {
                    continue;
                }
                let i = index as usize;
                let v = self.factors[[i, f]];
                let grad = g * (x * sum - v * x * x);
                let acc = &mut self.factor_sum_sq_grads[[i, f]];
                *acc += grad * grad;
                let step = self.eta / (acc.sqrt() + epsilon);
                self.factors[[i, f]] = v + step * grad;
            }
        }

        pred
    }

    fn predict(&self, sample: &Sample) -> f64 {
        let mut sums = vec![0.0; self.n_factors];
        self.score(sample, &mut sums)
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

    /// Linear (one-way) weights.
    fn weights(&mut self) -> SparseVector {
        SparseVector::from_dense(&self.weights)
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn headline(&self) -> &'static str {
        "Using SGD factorization machine (AdaGrad)"
    }

    fn description(&self) -> String {
        format!(
            "{}\nNumber of factors = {}\nLoss function = {}",
            self.headline(),
            self.n_factors,
            self.loss.description()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(label: f64, entries: &[(u32, f64)]) -> Sample {
        Sample::new(label, entries.iter().copied().collect())
    }

    fn machine(bits: u32, n_factors: usize, seed: u64) -> FactorizationMachine {
        let init = Normal::new(0.0, FactorizationMachine::DEFAULT_INIT_STD).unwrap();
        FactorizationMachine::new(bits, n_factors, init, seed)
    }

    #[test]
    fn factors_are_seeded() {
        let a = machine(4, 3, 7);
        let b = machine(4, 3, 7);
        let c = machine(4, 3, 8);
        assert_eq!(a.factors, b.factors);
        assert_ne!(a.factors, c.factors);
        assert_eq!(a.factors.dim(), (16, 3));
        let max = a.factors.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(max > 0.0 && max < 0.1);
    }

    #[test]
    fn factors_follow_init_distribution() {
        let wide = FactorizationMachine::new(10, 4, Normal::new(0.0, 1.0).unwrap(), 5);
        let n = wide.factors.len() as f64;
        let mean = wide.factors.sum() / n;
        let var = wide.factors.mapv(|v| (v - mean) * (v - mean)).sum() / n;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.08);
        assert_abs_diff_eq!(var, 1.0, epsilon = 0.1);

        let flat = FactorizationMachine::new(4, 2, Normal::new(0.0, 0.0).unwrap(), 5);
        assert!(flat.factors.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn score_matches_pairwise_sum() {
        let fm = machine(4, 2, 1);
        let s = sample(0.0, &[(1, 1.0), (2, -2.0), (5, 0.5)]);
        let mut pairwise = 0.0;
        let entries: Vec<_> = s.features.iter().collect();
        for (a, &(i, xi)) in entries.iter().enumerate() {
            for &(j, xj) in &entries[a + 1..] {
                let dot: f64 = (0..2)
                    .map(|f| fm.factors[[i as usize, f]] * fm.factors[[j as usize, f]])
                    .sum();
                pairwise += dot * xi * xj;
            }
        }
        assert_abs_diff_eq!(fm.predict(&s), pairwise, epsilon = 1e-15);
    }

    #[test]
    fn first_sight_keeps_factors() {
        let mut fm = machine(3, 2, 3);
        fm.set_learning_rate(0.0);
        let before = fm.factors.row(4).to_owned();
        fm.update(&sample(1.0, &[(4, 3.0)]));
        assert_eq!(fm.factors.row(4), before);
        assert_eq!(fm.scale[4], 3.0);
    }

    #[test]
    fn larger_value_rescales_parameters() {
        let mut fm = machine(3, 2, 3);
        fm.set_learning_rate(0.0);
        fm.update(&sample(1.0, &[(4, 2.0)]));
        let before = fm.factors.row(4).to_owned();
        fm.update(&sample(1.0, &[(4, 8.0)]));
        for f in 0..2 {
            assert_abs_diff_eq!(fm.factors[[4, f]], before[f] * 0.25, epsilon = 1e-18);
        }
    }

    #[test]
    fn learns_a_single_target() {
        let mut fm = machine(4, 4, 11);
        let s = sample(1.0, &[(0, 1.0), (3, 1.0), (7, 1.0)]);
        for _ in 0..200 {
            fm.update(&s);
        }
        assert_abs_diff_eq!(fm.predict(&s), 1.0, epsilon = 5e-2);
        assert!(fm.weights().len() >= 3);
    }

    #[test]
    fn description_lists_factors() {
        let mut fm = machine(3, 5, 0);
        fm.set_loss(Loss::logistic());
        assert_eq!(
            fm.description(),
            "Using SGD factorization machine (AdaGrad)\nNumber of factors = 5\nLoss function = Logistic loss"
        );
    }
}
