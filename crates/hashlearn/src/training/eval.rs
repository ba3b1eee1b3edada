//! Progressive loss accounting.

use super::objectives::sign;
use super::{Loss, LossFn};
use crate::data::Sample;

/// Weighted running loss over a sample stream.
///
/// In binary mode a sample costs its weight when `sign(score) != label`,
/// otherwise it costs `loss(score, label) · weight`. The weight of positive
/// (`label > 0`) and non-positive labels is tracked separately so the loss of
/// the best constant predictor can be reported next to the running average.
#[derive(Debug, Clone)]
pub struct LossAccumulator {
    loss: Loss,
    binary: bool,
    cumulative_loss: f64,
    weight_sum: f64,
    positive_weight: f64,
    negative_weight: f64,
    count: u64,
}

impl LossAccumulator {
    pub fn new(loss: Loss, binary: bool) -> Self {
        Self {
            loss,
            binary,
            cumulative_loss: 0.0,
            weight_sum: 0.0,
            positive_weight: 0.0,
            negative_weight: 0.0,
            count: 0,
        }
    }

    /// Account for `sample` scored at `score` (clamped, before the link).
    pub fn add(&mut self, score: f64, sample: &Sample) {
        self.cumulative_loss += if self.binary {
            if sign(score) != sample.label { sample.weight } else { 0.0 }
        } else {
            self.loss.loss(score, sample.label) * sample.weight
        };
        self.weight_sum += sample.weight;
        if sample.label > 0.0 {
            self.positive_weight += sample.weight;
        } else {
            self.negative_weight += sample.weight;
        }
        self.count += 1;
    }

    /// Weighted average loss, 0 before any sample.
    pub fn average(&self) -> f64 {
        if self.weight_sum > 0.0 { self.cumulative_loss / self.weight_sum } else { 0.0 }
    }

    /// Average loss of the best constant predictor on the labels seen so far.
    pub fn best_constant_loss(&self) -> f64 {
        self.loss.best_constant_loss(self.positive_weight, self.negative_weight)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SparseVector;
    use approx::assert_abs_diff_eq;

    fn labeled(label: f64, weight: f64) -> Sample {
        Sample::new(label, SparseVector::new()).with_weight(weight)
    }

    #[test]
    fn weighted_average() {
        let mut acc = LossAccumulator::new(Loss::squared(), false);
        assert_eq!(acc.average(), 0.0);
        acc.add(0.0, &labeled(1.0, 1.0));
        acc.add(0.0, &labeled(2.0, 3.0));
        // (1·1 + 4·3) / 4
        assert_abs_diff_eq!(acc.average(), 13.0 / 4.0);
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.weight_sum(), 4.0);
    }

    #[test]
    fn binary_mode_counts_sign_errors() {
        let mut acc = LossAccumulator::new(Loss::logistic(), true);
        acc.add(0.7, &labeled(1.0, 1.0));
        acc.add(0.7, &labeled(-1.0, 2.0));
        acc.add(0.0, &labeled(1.0, 1.0));
        assert_abs_diff_eq!(acc.average(), 3.0 / 4.0);
    }

    #[test]
    fn best_constant_uses_label_mass() {
        let mut acc = LossAccumulator::new(Loss::logistic(), false);
        acc.add(0.0, &labeled(1.0, 2.0));
        acc.add(0.0, &labeled(-1.0, 2.0));
        assert_abs_diff_eq!(acc.best_constant_loss(), std::f64::consts::LN_2, epsilon = 1e-12);
    }
}
