//! High-level online model: learner, link and prediction clamp.

use std::io::{Read, Write};

use crate::data::{Sample, SparseVector};
use crate::persist::{self, SnapshotError};
use crate::training::{AnyLearner, Learner, Link, Loss};

use super::{Algorithm, ConfigError, LearnerConfig};

/// A learner wrapped with its output transformation.
///
/// Raw scores are clamped to `[min_prediction, max_prediction]` before the
/// link is applied, both when learning and when predicting.
///
/// # Example
///
/// ```
/// use hashlearn::model::{LearnerConfig, OnlineModel};
/// use hashlearn::parser::{InstanceParser, VwParser};
///
/// let parser = VwParser::new(18, None);
/// let mut model = OnlineModel::new(LearnerConfig::default()).unwrap();
/// for line in ["1 |f a b", "-1 |f c", "1 |f a"] {
///     let sample = parser.parse(line).unwrap();
///     model.learn(&sample);
/// }
/// let score = model.predict(&parser.parse("|f a").unwrap());
/// assert!(score > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct OnlineModel {
    learner: AnyLearner,
    link: Link,
    min_prediction: f64,
    max_prediction: f64,
}

impl OnlineModel {
    /// Build the learner described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the learner cannot be built from `config`.
    pub fn new(config: LearnerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            learner: AnyLearner::from_config(&config)?,
            link: config.link,
            min_prediction: config.min_prediction,
            max_prediction: config.max_prediction,
        })
    }

    /// Wrap an existing learner, e.g. one restored from a snapshot.
    pub fn from_parts(learner: AnyLearner, link: Link, min_prediction: f64, max_prediction: f64) -> Self {
        Self {
            learner,
            link,
            min_prediction,
            max_prediction,
        }
    }

    // =========================================================================
    // Learning and prediction
    // =========================================================================

    /// Learn from `sample`. Returns the linked prediction made before the update.
    pub fn learn(&mut self, sample: &Sample) -> f64 {
        let score = self.learn_score(sample);
        self.link.apply(score)
    }

    /// Learn from `sample`. Returns the clamped raw score made before the update.
    pub fn learn_score(&mut self, sample: &Sample) -> f64 {
        let raw = self.learner.update(sample);
        self.clamp(raw)
    }

    /// Linked, clamped prediction.
    pub fn predict(&self, sample: &Sample) -> f64 {
        self.link.apply(self.score(sample))
    }

    /// Clamped raw score.
    pub fn score(&self, sample: &Sample) -> f64 {
        self.clamp(self.learner.predict(sample))
    }

    /// Unclamped raw score.
    pub fn raw_score(&self, sample: &Sample) -> f64 {
        self.learner.predict(sample)
    }

    #[inline]
    fn clamp(&self, score: f64) -> f64 {
        score.max(self.min_prediction).min(self.max_prediction)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current effective weights.
    pub fn weights(&mut self) -> SparseVector {
        self.learner.weights()
    }

    pub fn learner(&self) -> &AnyLearner {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut AnyLearner {
        &mut self.learner
    }

    pub fn algorithm(&self) -> Algorithm {
        self.learner.algorithm()
    }

    pub fn loss(&self) -> Loss {
        self.learner.loss()
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn bits(&self) -> u32 {
        self.learner.bits()
    }

    pub fn prediction_range(&self) -> (f64, f64) {
        (self.min_prediction, self.max_prediction)
    }

    /// Learner description followed by the link description.
    pub fn description(&self) -> String {
        format!("{}\n{}", self.learner.description(), self.link.description())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Write a JSON snapshot.
    pub fn save_json<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        persist::write_json(self, writer)
    }

    /// Read a JSON snapshot, inflating the tables to `2^bits` entries.
    pub fn load_json<R: Read>(reader: R, bits: u32) -> Result<Self, SnapshotError> {
        persist::read_json(reader, bits)
    }

    /// Encode a binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        persist::to_bytes(self)
    }

    /// Decode a binary snapshot, inflating the tables to `2^bits` entries.
    pub fn from_bytes(bytes: &[u8], bits: u32) -> Result<Self, SnapshotError> {
        persist::from_bytes(bytes, bits)
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
    fn clamps_before_link() {
        let config = LearnerConfig::builder()
            .bits(3)
            .learning_rate(1e6)
            .min_prediction(-1.0)
            .max_prediction(1.0)
            .algorithm(Algorithm::PerCoordinateSolo)
            .build()
            .unwrap();
        let mut model = OnlineModel::new(config).unwrap();
        let s = sample(100.0, &[(1, 1.0)]);
        model.learn(&s);
        assert!(model.raw_score(&s) > 1.0);
        assert_eq!(model.score(&s), 1.0);
        assert_eq!(model.predict(&s), 1.0);
    }

    #[test]
    fn logistic_link_outputs_probabilities() {
        let config = LearnerConfig::builder()
            .bits(3)
            .loss(Loss::logistic())
            .link(Link::Logistic)
            .build()
            .unwrap();
        let mut model = OnlineModel::new(config).unwrap();
        let s = sample(1.0, &[(0, 1.0)]);
        assert_abs_diff_eq!(model.learn(&s), 0.5);
        for _ in 0..20 {
            model.learn(&s);
        }
        let p = model.predict(&s);
        assert!(p > 0.5 && p < 1.0);
    }

    #[test]
    fn description_includes_link() {
        let model = OnlineModel::new(LearnerConfig::builder().bits(2).build().unwrap()).unwrap();
        assert!(model.description().ends_with("Identity link function"));
        assert!(model.description().starts_with("Using VW optimizer"));
    }
}
