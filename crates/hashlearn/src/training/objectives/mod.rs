//! Loss functions for online learning.
//!
//! Every loss exposes the plain loss value, the importance-weighted negative
//! gradient used by ordinary updates, an importance-aware "invariant" variant
//! for learners that precondition the step by the feature norm, and the
//! closed-form loss of the best constant predictor on binary labels.
//!
//! # Available Losses
//!
//! ## Regression
//! - [`SquaredLoss`]: squared error
//! - [`AbsoluteLoss`]: absolute error
//!
//! ## Classification
//! - [`LogisticLoss`]: log loss on `{-1, +1}` labels
//! - [`HingeLoss`]: SVM-style hinge

mod classification;
mod regression;

pub use classification::{HingeLoss, LogisticLoss};
pub use regression::{AbsoluteLoss, SquaredLoss};

use std::fmt;
use std::str::FromStr;

use crate::model::ConfigError;

/// Sign with `sign(0) = 0`.
///
/// `f64::signum` maps `±0.0` to `±1.0`, which would make the absolute loss
/// push on samples it already fits exactly.
#[inline]
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// =============================================================================
// LossFn Trait
// =============================================================================

/// A convex loss on a scalar prediction.
pub trait LossFn: Send + Sync {
    /// Loss of predicting `pred` for `label`.
    fn loss(&self, pred: f64, label: f64) -> f64;

    /// Negative gradient with respect to `pred`, scaled by the importance
    /// weight where the loss is differentiable in it.
    fn negative_gradient(&self, pred: f64, label: f64, importance: f64) -> f64;

    /// Importance-aware negative gradient.
    ///
    /// `eta_importance` is the product of learning rate and importance,
    /// `norm_x` the squared norm of the feature vector. The returned step
    /// cannot overshoot the label no matter how large their product is.
    fn negative_gradient_invariant(&self, pred: f64, label: f64, eta_importance: f64, norm_x: f64) -> f64;

    /// Average loss of the best constant predictor, given the total weight
    /// of positive (`s_plus`) and negative (`s_minus`) labels.
    fn best_constant_loss(&self, s_plus: f64, s_minus: f64) -> f64;

    /// Short configuration name.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;
}

// =============================================================================
// Loss Enum
// =============================================================================

/// Loss function selection.
///
/// The set of losses is closed; learners hold a `Loss` by value and dispatch
/// with a `match`, so the hot path stays free of virtual calls.
///
/// # Example
///
/// ```
/// use hashlearn::training::{Loss, LossFn};
///
/// let loss = Loss::logistic();
/// assert!(loss.negative_gradient(0.0, 1.0, 1.0) > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    /// Squared error for regression.
    SquaredLoss(SquaredLoss),
    /// Absolute error for robust regression.
    AbsoluteLoss(AbsoluteLoss),
    /// Logistic loss for binary classification.
    LogisticLoss(LogisticLoss),
    /// Hinge loss for binary classification.
    HingeLoss(HingeLoss),
}

/// Convenience constructors.
impl Loss {
    pub fn squared() -> Self {
        Self::SquaredLoss(SquaredLoss)
    }

    pub fn absolute() -> Self {
        Self::AbsoluteLoss(AbsoluteLoss)
    }

    pub fn logistic() -> Self {
        Self::LogisticLoss(LogisticLoss)
    }

    pub fn hinge() -> Self {
        Self::HingeLoss(HingeLoss)
    }
}

impl Default for Loss {
    fn default() -> Self {
        Self::squared()
    }
}

impl LossFn for Loss {
    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        match self {
            Self::SquaredLoss(inner) => inner.loss(pred, label),
            Self::AbsoluteLoss(inner) => inner.loss(pred, label),
            Self::LogisticLoss(inner) => inner.loss(pred, label),
            Self::HingeLoss(inner) => inner.loss(pred, label),
        }
    }

    #[inline]
    fn negative_gradient(&self, pred: f64, label: f64, importance: f64) -> f64 {
        match self {
            Self::SquaredLoss(inner) => inner.negative_gradient(pred, label, importance),
            Self::AbsoluteLoss(inner) => inner.negative_gradient(pred, label, importance),
            Self::LogisticLoss(inner) => inner.negative_gradient(pred, label, importance),
            Self::HingeLoss(inner) => inner.negative_gradient(pred, label, importance),
        }
    }

    #[inline]
    fn negative_gradient_invariant(&self, pred: f64, label: f64, eta_importance: f64, norm_x: f64) -> f64 {
        match self {
            Self::SquaredLoss(inner) => inner.negative_gradient_invariant(pred, label, eta_importance, norm_x),
            Self::AbsoluteLoss(inner) => inner.negative_gradient_invariant(pred, label, eta_importance, norm_x),
            Self::LogisticLoss(inner) => inner.negative_gradient_invariant(pred, label, eta_importance, norm_x),
            Self::HingeLoss(inner) => inner.negative_gradient_invariant(pred, label, eta_importance, norm_x),
        }
    }

    fn best_constant_loss(&self, s_plus: f64, s_minus: f64) -> f64 {
        match self {
            Self::SquaredLoss(inner) => inner.best_constant_loss(s_plus, s_minus),
            Self::AbsoluteLoss(inner) => inner.best_constant_loss(s_plus, s_minus),
            Self::LogisticLoss(inner) => inner.best_constant_loss(s_plus, s_minus),
            Self::HingeLoss(inner) => inner.best_constant_loss(s_plus, s_minus),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SquaredLoss(inner) => inner.name(),
            Self::AbsoluteLoss(inner) => inner.name(),
            Self::LogisticLoss(inner) => inner.name(),
            Self::HingeLoss(inner) => inner.name(),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::SquaredLoss(inner) => inner.description(),
            Self::AbsoluteLoss(inner) => inner.description(),
            Self::LogisticLoss(inner) => inner.description(),
            Self::HingeLoss(inner) => inner.description(),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Loss {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squared" => Ok(Self::squared()),
            "absolute" => Ok(Self::absolute()),
            "logistic" => Ok(Self::logistic()),
            "hinge" => Ok(Self::hinge()),
            other => Err(ConfigError::UnknownLoss(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
