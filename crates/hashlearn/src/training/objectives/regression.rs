//! Regression losses.

use super::{LossFn, sign};

// =============================================================================
// Squared Loss
// =============================================================================

/// Squared error loss.
///
/// - Loss: `(pred - label)²`
/// - Negative gradient: `2 · importance · (label - pred)`
/// - Invariant step: the gradient damped by `(1 - e^{-η·i·‖x‖²}) / ‖x‖²`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredLoss;

impl LossFn for SquaredLoss {
    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        (pred - label) * (pred - label)
    }

    #[inline]
    fn negative_gradient(&self, pred: f64, label: f64, importance: f64) -> f64 {
        2.0 * (label - pred) * importance
    }

    #[inline]
    fn negative_gradient_invariant(&self, pred: f64, label: f64, eta_importance: f64, norm_x: f64) -> f64 {
        2.0 * (label - pred) * (1.0 - (-eta_importance * norm_x).exp()) / norm_x
    }

    fn best_constant_loss(&self, s_plus: f64, s_minus: f64) -> f64 {
        let ratio = s_plus / s_minus;
        let c = (ratio - 1.0) / (ratio + 1.0);
        (s_plus * (1.0 - c) * (1.0 - c) + s_minus * (1.0 + c) * (1.0 + c)) / (s_plus + s_minus)
    }

    fn name(&self) -> &'static str {
        "squared"
    }

    fn description(&self) -> &'static str {
        "Square loss"
    }
}

// =============================================================================
// Absolute Loss
// =============================================================================

/// Absolute error loss.
///
/// - Loss: `|pred - label|`
/// - Negative gradient: `sign(label - pred)`, with `sign(0) = 0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsoluteLoss;

impl LossFn for AbsoluteLoss {
    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        (pred - label).abs()
    }

    #[inline]
    fn negative_gradient(&self, pred: f64, label: f64, _importance: f64) -> f64 {
        sign(label - pred)
    }

    #[inline]
    fn negative_gradient_invariant(&self, pred: f64, label: f64, _eta_importance: f64, _norm_x: f64) -> f64 {
        sign(label - pred)
    }

    fn best_constant_loss(&self, _s_plus: f64, _s_minus: f64) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "absolute"
    }

    fn description(&self) -> &'static str {
        "Absolute loss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn squared_values() {
        let l = SquaredLoss;
        assert_eq!(l.loss(0.0, 0.0), 0.0);
        assert_eq!(l.loss(0.0, 1.0), 1.0);
        assert_eq!(l.loss(0.0, 2.0), 4.0);
        assert_eq!(l.loss(1.0, 2.0), 1.0);
        assert_eq!(l.loss(-1.0, 2.0), 9.0);
        assert_eq!(l.negative_gradient(1.0, 2.0, 3.0), 6.0);
    }

    #[test]
    fn squared_invariant_is_damped() {
        let l = SquaredLoss;
        let raw = l.negative_gradient(0.0, 1.0, 1.0);
        let inv = l.negative_gradient_invariant(0.0, 1.0, 1.0, 1.0);
        assert_abs_diff_eq!(inv, raw * (1.0 - (-1.0f64).exp()), epsilon = 1e-15);
        // Small steps approach the plain gradient times the step.
        let tiny = l.negative_gradient_invariant(0.0, 1.0, 1e-8, 1.0);
        assert_abs_diff_eq!(tiny / 1e-8, raw, epsilon = 1e-6);
    }

    #[test]
    fn squared_best_constant() {
        // Balanced labels: best constant is 0, loss 1.
        assert_abs_diff_eq!(SquaredLoss.best_constant_loss(5.0, 5.0), 1.0, epsilon = 1e-12);
        // 3:1 split: c = 0.5, loss = (3·0.25 + 1·2.25)/4.
        assert_abs_diff_eq!(SquaredLoss.best_constant_loss(3.0, 1.0), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn absolute_values() {
        let l = AbsoluteLoss;
        assert_eq!(l.loss(0.0, 0.0), 0.0);
        assert_eq!(l.loss(0.0, -1.0), 1.0);
        assert_eq!(l.loss(-2.0, 1.0), 3.0);
        assert_eq!(l.loss(-2.0, -1.0), 1.0);
        assert_eq!(l.negative_gradient(0.0, 0.0, 1.0), 0.0);
        assert_eq!(l.negative_gradient(-1.0, 1.0, 1.0), 1.0);
        assert_eq!(l.negative_gradient(1.0, -1.0, 5.0), -1.0);
    }
}
