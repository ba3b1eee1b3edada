//! Binary classification losses. Labels are expected in `{-1, +1}`.

use super::LossFn;

// =============================================================================
// Logistic Loss
// =============================================================================

/// Logistic loss.
///
/// - Loss: `ln(1 + e^{-pred·label})`
/// - Negative gradient: `importance · label / (1 + e^{label·pred})`
/// - Invariant step: closed form through a Lambert-W style approximation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogisticLoss;

/// `W(e^x) - x`, approximated with one Halley-like refinement.
fn wexpmx(x: f64) -> f64 {
    let w = if x >= 1.0 { 0.86 * x + 0.01 } else { (0.8 * x - 0.65).exp() };
    let r = if x >= 1.0 { x - w.ln() - w } else { 0.2 * x + 0.65 - w };
    let t = 1.0 + w;
    let u = 2.0 * t * (t + 2.0 * r / 3.0);
    w * (1.0 + r / t * (u - r) / (u - 2.0 * r)) - x
}

impl LossFn for LogisticLoss {
    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        ((-pred * label).exp() + 1.0).ln()
    }

    #[inline]
    fn negative_gradient(&self, pred: f64, label: f64, importance: f64) -> f64 {
        label / (1.0 + (label * pred).exp()) * importance
    }

    fn negative_gradient_invariant(&self, pred: f64, label: f64, eta_importance: f64, norm_x: f64) -> f64 {
        let d = (label * pred).exp();
        let x = eta_importance * norm_x + label * pred + d;
        let w = wexpmx(x);
        -(label * w + pred) / norm_x
    }

    fn best_constant_loss(&self, s_plus: f64, s_minus: f64) -> f64 {
        let c = (s_plus / s_minus).ln();
        (s_plus * (1.0 + (-c).exp()).ln() + s_minus * (1.0 + c.exp()).ln()) / (s_plus + s_minus)
    }

    fn name(&self) -> &'static str {
        "logistic"
    }

    fn description(&self) -> &'static str {
        "Logistic loss"
    }
}

// =============================================================================
// Hinge Loss
// =============================================================================

/// Hinge loss.
///
/// - Loss: `max(0, 1 - pred·label)`
/// - Negative gradient: `label` inside the margin, 0 outside
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HingeLoss;

impl LossFn for HingeLoss {
    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        (1.0 - pred * label).max(0.0)
    }

    #[inline]
    fn negative_gradient(&self, pred: f64, label: f64, _importance: f64) -> f64 {
        if 1.0 - pred * label > 0.0 { label } else { 0.0 }
    }

    #[inline]
    fn negative_gradient_invariant(&self, pred: f64, label: f64, eta_importance: f64, _norm_x: f64) -> f64 {
        self.negative_gradient(pred, label, eta_importance)
    }

    fn best_constant_loss(&self, s_plus: f64, s_minus: f64) -> f64 {
        let c = super::sign(s_plus - s_minus);
        (s_plus * (1.0 - c) + s_minus * (1.0 + c)) / (s_plus + s_minus)
    }

    fn name(&self) -> &'static str {
        "hinge"
    }

    fn description(&self) -> &'static str {
        "Hinge loss"
    }
}
