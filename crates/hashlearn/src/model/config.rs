//! Learner configuration with builder pattern.
//!
//! [`LearnerConfig`] gathers everything needed to construct a learner and
//! wrap it into an [`OnlineModel`](super::OnlineModel). It uses the `bon`
//! crate for builder generation, with validation at build time.
//!
//! # Example
//!
//! ```
//! use hashlearn::model::{Algorithm, LearnerConfig};
//! use hashlearn::training::{Link, Loss};
//!
//! // All defaults: normalized adaptive SGD on squared loss
//! let config = LearnerConfig::builder().build().unwrap();
//!
//! // Coin betting on logistic loss, probabilities out
//! let config = LearnerConfig::builder()
//!     .algorithm(Algorithm::PerCoordinateCocob)
//!     .loss(Loss::logistic())
//!     .link(Link::Logistic)
//!     .bits(22)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use bon::Builder;
use rand_distr::Normal;

use crate::hashing::{DEFAULT_BITS, clamp_bits};
use crate::training::{FactorizationMachine, Link, Loss, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown loss function {0:?}, expected one of: squared, hinge, logistic, absolute")]
    UnknownLoss(String),
    #[error("unknown link function {0:?}, expected one of: identity, logistic")]
    UnknownLink(String),
    #[error("unknown algorithm {0:?}, expected one of: sgd_vw, solo, pcsolo, pistol, kt, pckt, cocob, pccocob, fm")]
    UnknownAlgorithm(String),
    #[error("learning_rate must be positive and finite, got {0}")]
    InvalidLearningRate(f64),
    #[error("n_factors must be at least 1")]
    InvalidFactorCount,
    #[error("init_std must be non-negative and finite, got {0}")]
    InvalidInitStd(f64),
    #[error("min_prediction ({min}) must be below max_prediction ({max})")]
    InvalidPredictionRange { min: f64, max: f64 },
    #[error("holdout_period must be at least 2, got {0}")]
    InvalidHoldoutPeriod(u64),
}

// =============================================================================
// Algorithm
// =============================================================================

/// Online optimizer selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Normalized adaptive SGD.
    #[default]
    SgdVw,
    Solo,
    PerCoordinateSolo,
    /// PiSTOL only exists in its per-coordinate form.
    PerCoordinatePistol,
    Kt,
    PerCoordinateKt,
    Cocob,
    PerCoordinateCocob,
    FactorizationMachine,
}

impl Algorithm {
    pub const ALL: [Algorithm; 9] = [
        Self::SgdVw,
        Self::Solo,
        Self::PerCoordinateSolo,
        Self::PerCoordinatePistol,
        Self::Kt,
        Self::PerCoordinateKt,
        Self::Cocob,
        Self::PerCoordinateCocob,
        Self::FactorizationMachine,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::SgdVw => "sgd_vw",
            Self::Solo => "solo",
            Self::PerCoordinateSolo => "pcsolo",
            Self::PerCoordinatePistol => "pistol",
            Self::Kt => "kt",
            Self::PerCoordinateKt => "pckt",
            Self::Cocob => "cocob",
            Self::PerCoordinateCocob => "pccocob",
            Self::FactorizationMachine => "fm",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sgd" => Ok(Self::SgdVw),
            other => Self::ALL
                .into_iter()
                .find(|a| a.name() == other)
                .ok_or_else(|| ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

// =============================================================================
// LearnerConfig
// =============================================================================

/// Configuration for a single online learner.
///
/// # Structure
///
/// - **Optimization**: algorithm, loss and learning rate
/// - **Model**: hash table width, factorization machine settings
/// - **Output**: link function and prediction clamp
///
/// `bits` outside `[1, 31]` is clamped, not rejected.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct LearnerConfig {
    // === Optimization ===
    /// Optimizer. Default: normalized adaptive SGD.
    #[builder(default)]
    pub algorithm: Algorithm,

    /// Loss function. Default: squared loss.
    #[builder(default)]
    pub loss: Loss,

    /// Learning rate, or initial wealth for coin-betting optimizers. Default: 1.0.
    #[builder(default = 1.0)]
    pub learning_rate: f64,

    // === Model ===
    /// Hash table width. Default: 18.
    #[builder(default = DEFAULT_BITS)]
    pub bits: u32,

    /// Latent factors per feature (factorization machine only). Default: 8.
    #[builder(default = 8)]
    pub n_factors: usize,

    /// Standard deviation of the Gaussian factor initialization. Default: 0.01.
    #[builder(default = FactorizationMachine::DEFAULT_INIT_STD)]
    pub init_std: f64,

    /// Seed for the factor initialization. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Output ===
    /// Link applied to the clamped raw score. Default: identity.
    #[builder(default)]
    pub link: Link,

    /// Lower clamp for raw scores. Default: -50.
    #[builder(default = -50.0)]
    pub min_prediction: f64,

    /// Upper clamp for raw scores. Default: 50.
    #[builder(default = 50.0)]
    pub max_prediction: f64,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: learner_config_builder::IsComplete> LearnerConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `learning_rate` is not positive and finite
    /// - `n_factors == 0`
    /// - `init_std` is negative or not finite
    /// - `min_prediction >= max_prediction`
    pub fn build(self) -> Result<LearnerConfig, ConfigError> {
        let mut config = self.__build_internal();
        config.bits = clamp_bits(config.bits);
        config.validate()?;
        Ok(config)
    }
}

impl LearnerConfig {
    /// Distribution the factorization machine draws its initial factors from.
    pub fn factor_init(&self) -> Result<Normal<f64>, ConfigError> {
        if !self.init_std.is_finite() {
            return Err(ConfigError::InvalidInitStd(self.init_std));
        }
        Normal::new(0.0, self.init_std).map_err(|_| ConfigError::InvalidInitStd(self.init_std))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_factors == 0 {
            return Err(ConfigError::InvalidFactorCount);
        }
        self.factor_init()?;
        if !(self.min_prediction < self.max_prediction) {
            return Err(ConfigError::InvalidPredictionRange {
                min: self.min_prediction,
                max: self.max_prediction,
            });
        }
        Ok(())
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// Tests
// =============================================================================
