//! Online optimizers over hashed weight tables.
//!
//! Every learner owns one or more dense arrays of length `2^bits`, indexed
//! directly by hashed feature index, and consumes samples one at a time.
//! `update` returns the prediction made before the state changes; `predict`
//! never mutates.
//!
//! # Available Learners
//!
//! - [`SgdVw`]: normalized adaptive SGD
//! - [`Solo`], [`PerCoordinateSolo`]: scale-free online learning
//! - [`PerCoordinatePistol`]: parameter-free stochastic learning
//! - [`Kt`], [`PerCoordinateKt`]: Krichevsky-Trofimov coin betting
//! - [`Cocob`], [`PerCoordinateCocob`]: continuous coin betting
//! - [`FactorizationMachine`]: second-order factorization machine
//!
//! # Table indexing
//!
//! Feature indices are used as array offsets without bounds checks beyond
//! the slice's own. A sample carrying an index `>= 2^bits` panics; pick the
//! same `bits` for parser and learner.

use crate::training::objectives::LossFn;

mod cocob;
mod fm;
mod kt;
mod pistol;
mod sgd_vw;
mod solo;

pub use cocob::{Cocob, PerCoordinateCocob};
pub use fm::FactorizationMachine;
pub use kt::{Kt, PerCoordinateKt};
pub use pistol::PerCoordinatePistol;
pub use sgd_vw::SgdVw;
pub use solo::{PerCoordinateSolo, Solo};

use crate::data::{Sample, SparseVector};
use crate::model::{Algorithm, ConfigError, LearnerConfig};
use crate::training::Loss;

// =============================================================================
// Learner Trait
// =============================================================================

/// A stateful online optimizer.
pub trait Learner: Send + Sync {
    /// Predict on `sample`, then learn from it. Returns the raw score computed
    /// before the update.
    ///
    /// # Panics
    ///
    /// Panics if a feature index is outside the weight table.
    fn update(&mut self, sample: &Sample) -> f64;

    /// Raw score of `sample` under the current state.
    ///
    /// # Panics
    ///
    /// Panics if a feature index is outside the weight table.
    fn predict(&self, sample: &Sample) -> f64;

    fn loss(&self) -> Loss;

    fn set_loss(&mut self, loss: Loss);

    /// Learning rate, or the initial wealth for coin-betting learners.
    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, eta: f64);

    /// Current effective weights, zero entries omitted.
    fn weights(&mut self) -> SparseVector;

    /// Width of the hashed weight table.
    fn bits(&self) -> u32;

    /// One-line name of the optimizer.
    fn headline(&self) -> &'static str;

    /// Multi-line description: optimizer, learning rate and loss.
    fn description(&self) -> String {
        format!(
            "{}\nInitial learning rate = {:?}\nLoss function = {}",
            self.headline(),
            self.learning_rate(),
            self.loss().description()
        )
    }
}

/// Saturating odd sigmoid, `tanh(x / 2)` with a hard cap above 20.
#[inline]
pub fn shrink(x: f64) -> f64 {
    if x > 20.0 {
        1.0
    } else {
        let e = x.exp();
        (e - 1.0) / (e + 1.0)
    }
}

// =============================================================================
// Weight Cache
// =============================================================================

/// Materialized weights, valid for one update count.
#[derive(Debug, Clone, Default)]
pub(crate) struct WeightCache {
    stamp: Option<u64>,
    weights: SparseVector,
}

impl WeightCache {
    pub(crate) fn is_stale(&self, iteration: u64) -> bool {
        self.stamp != Some(iteration)
    }

    pub(crate) fn store(&mut self, iteration: u64, weights: SparseVector) {
        self.stamp = Some(iteration);
        self.weights = weights;
    }

    pub(crate) fn weights(&self) -> &SparseVector {
        &self.weights
    }

    pub(crate) fn invalidate(&mut self) {
        self.stamp = None;
    }
}

// =============================================================================
// AnyLearner
// =============================================================================

/// Closed set of learners, selected at runtime from a [`LearnerConfig`].
#[derive(Debug, Clone)]
pub enum AnyLearner {
    SgdVw(SgdVw),
    Solo(Solo),
    PerCoordinateSolo(PerCoordinateSolo),
    PerCoordinatePistol(PerCoordinatePistol),
    Kt(Kt),
    PerCoordinateKt(PerCoordinateKt),
    Cocob(Cocob),
    PerCoordinateCocob(PerCoordinateCocob),
    FactorizationMachine(FactorizationMachine),
}

impl AnyLearner {
    /// Build the learner named by `config`, with its loss and learning rate applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInitStd`] if the factor initialization
    /// cannot be built.
    pub fn from_config(config: &LearnerConfig) -> Result<Self, ConfigError> {
        let bits = config.bits;
        let mut learner = match config.algorithm {
            Algorithm::SgdVw => Self::SgdVw(SgdVw::new(bits)),
            Algorithm::Solo => Self::Solo(Solo::new(bits)),
            Algorithm::PerCoordinateSolo => Self::PerCoordinateSolo(PerCoordinateSolo::new(bits)),
            Algorithm::PerCoordinatePistol => Self::PerCoordinatePistol(PerCoordinatePistol::new(bits)),
            Algorithm::Kt => Self::Kt(Kt::new(bits)),
            Algorithm::PerCoordinateKt => Self::PerCoordinateKt(PerCoordinateKt::new(bits)),
            Algorithm::Cocob => Self::Cocob(Cocob::new(bits)),
            Algorithm::PerCoordinateCocob => Self::PerCoordinateCocob(PerCoordinateCocob::new(bits)),
            Algorithm::FactorizationMachine => Self::FactorizationMachine(FactorizationMachine::new(
                bits,
                config.n_factors,
                config.factor_init()?,
                config.seed,
            )),
        };
        learner.set_loss(config.loss);
        learner.set_learning_rate(config.learning_rate);
        Ok(learner)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::SgdVw(_) => Algorithm::SgdVw,
            Self::Solo(_) => Algorithm::Solo,
            Self::PerCoordinateSolo(_) => Algorithm::PerCoordinateSolo,
            Self::PerCoordinatePistol(_) => Algorithm::PerCoordinatePistol,
            Self::Kt(_) => Algorithm::Kt,
            Self::PerCoordinateKt(_) => Algorithm::PerCoordinateKt,
            Self::Cocob(_) => Algorithm::Cocob,
            Self::PerCoordinateCocob(_) => Algorithm::PerCoordinateCocob,
            Self::FactorizationMachine(_) => Algorithm::FactorizationMachine,
        }
    }

    fn inner(&self) -> &dyn Learner {
        match self {
            Self::SgdVw(inner) => inner,
            Self::Solo(inner) => inner,
            Self::PerCoordinateSolo(inner) => inner,
            Self::PerCoordinatePistol(inner) => inner,
            Self::Kt(inner) => inner,
            Self::PerCoordinateKt(inner) => inner,
            Self::Cocob(inner) => inner,
            Self::PerCoordinateCocob(inner) => inner,
            Self::FactorizationMachine(inner) => inner,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Learner {
        match self {
            Self::SgdVw(inner) => inner,
            Self::Solo(inner) => inner,
            Self::PerCoordinateSolo(inner) => inner,
            Self::PerCoordinatePistol(inner) => inner,
            Self::Kt(inner) => inner,
            Self::PerCoordinateKt(inner) => inner,
            Self::Cocob(inner) => inner,
            Self::PerCoordinateCocob(inner) => inner,
            Self::FactorizationMachine(inner) => inner,
        }
    }
}

impl Learner for AnyLearner {
    fn update(&mut self, sample: &Sample) -> f64 {
        self.inner_mut().update(sample)
    }

    fn predict(&self, sample: &Sample) -> f64 {
        self.inner().predict(sample)
    }

    fn loss(&self) -> Loss {
        self.inner().loss()
    }

    fn set_loss(&mut self, loss: Loss) {
        self.inner_mut().set_loss(loss)
    }

    fn learning_rate(&self) -> f64 {
        self.inner().learning_rate()
    }

    fn set_learning_rate(&mut self, eta: f64) {
        self.inner_mut().set_learning_rate(eta)
    }

    fn weights(&mut self) -> SparseVector {
        self.inner_mut().weights()
    }

    fn bits(&self) -> u32 {
        self.inner().bits()
    }

    fn headline(&self) -> &'static str {
        self.inner().headline()
    }

    fn description(&self) -> String {
        self.inner().description()
    }
}
