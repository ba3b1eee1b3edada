//! Progressive-validation driver for online learning.
//!
//! [`OnlineTrainer`] feeds a sample stream to an [`OnlineModel`], scoring each
//! sample before learning from it. The running average of these scores' losses
//! is the progressive validation loss.
//!
//! With more than one pass, every `holdout_period`-th sample of the first pass
//! is set aside. The remaining samples are buffered in memory and replayed on
//! later passes; after every pass the holdout loss is measured and training
//! stops as soon as it goes up.

use super::callback::EarlyStopping;
use super::eval::LossAccumulator;
use super::learners::Learner;
use super::logger::{ProgressLine, ProgressSchedule, TrainingLogger, Verbosity};
use crate::data::Sample;
use crate::model::{ConfigError, OnlineModel};

/// Parameters of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
    /// Passes over the data. Values above 1 enable the holdout.
    pub passes: usize,
    /// One sample in `holdout_period` goes to the holdout during pass 0.
    pub holdout_period: u64,
    /// Report the weighted 0/1 loss instead of the training loss.
    pub binary_loss: bool,
    /// Score only, never update.
    pub test_only: bool,
    pub progress: ProgressSchedule,
    pub verbosity: Verbosity,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            passes: 1,
            holdout_period: 10,
            binary_loss: false,
            test_only: false,
            progress: ProgressSchedule::default(),
            verbosity: Verbosity::Silent,
        }
    }
}

impl TrainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.holdout_period < 2 {
            return Err(ConfigError::InvalidHoldoutPeriod(self.holdout_period));
        }
        Ok(())
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// Samples read from the input stream.
    pub samples_seen: u64,
    pub passes_completed: usize,
    /// Progressive loss over every training step of every pass.
    pub average_loss: f64,
    /// Loss of the best constant predictor on the training labels.
    pub best_constant_loss: f64,
    /// Holdout loss after each pass. Empty for single-pass runs.
    pub holdout_losses: Vec<f64>,
    pub early_stopped: bool,
    /// Samples used for training in pass 0.
    pub n_train: usize,
    pub n_holdout: usize,
}

/// Multi-pass online trainer.
#[derive(Debug, Clone, Default)]
pub struct OnlineTrainer {
    params: TrainParams,
}

impl OnlineTrainer {
    pub fn new(params: TrainParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainParams {
        &self.params
    }

    /// Train `model` on `samples`.
    ///
    /// `on_prediction` receives every training sample together with the
    /// linked prediction made before learning from it, on every pass.
    /// Holdout samples are not reported.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHoldoutPeriod`] if `holdout_period < 2`.
    pub fn run<I, F>(&self, model: &mut OnlineModel, samples: I, mut on_prediction: F) -> Result<TrainReport, ConfigError>
    where
        I: IntoIterator<Item = Sample>,
        F: FnMut(&Sample, f64),
    {
        self.params.validate()?;
        let passes = self.params.passes.max(1);
        let multi_pass = passes > 1;

        let mut logger = TrainingLogger::with_schedule(self.params.verbosity, self.params.progress);
        logger.start_training(passes, &model.learner().description(), model.link().description());

        let mut progressive = LossAccumulator::new(model.loss(), self.params.binary_loss);
        let mut last_line = None;
        let mut report = TrainReport::default();

        // Pass 0 streams; only multi-pass runs keep the samples around.
        let mut train = Vec::new();
        let mut holdout = Vec::new();
        for sample in samples {
            report.samples_seen += 1;
            if multi_pass && report.samples_seen % self.params.holdout_period == 0 {
                holdout.push(sample);
                continue;
            }
            let line = self.step(model, &sample, &mut progressive, &mut on_prediction);
            logger.log_progress(line);
            last_line = Some(line);
            report.n_train += 1;
            if multi_pass {
                train.push(sample);
            }
        }
        report.n_holdout = holdout.len();
        report.passes_completed = 1;

        if multi_pass {
            logger.log_first_pass(report.n_train, report.n_holdout);
            if holdout.is_empty() {
                logger.warn("holdout is empty, early stopping disabled");
            }
            let mut early_stop = EarlyStopping::new(1);
            for pass in 0..passes {
                if pass > 0 {
                    for sample in &train {
                        let line = self.step(model, sample, &mut progressive, &mut on_prediction);
                        logger.log_progress(line);
                        last_line = Some(line);
                    }
                    report.passes_completed += 1;
                }
                if holdout.is_empty() {
                    continue;
                }
                let loss = self.evaluate(model, &holdout);
                report.holdout_losses.push(loss);
                logger.log_holdout(pass, loss);
                if early_stop.should_stop(loss) {
                    logger.log_early_stopping(pass, early_stop.best_pass());
                    report.early_stopped = true;
                    break;
                }
            }
        }

        report.average_loss = progressive.average();
        report.best_constant_loss = progressive.best_constant_loss();
        logger.finish_training(last_line, report.best_constant_loss);
        Ok(report)
    }

    /// Weighted loss of `model` on `samples`, without learning.
    pub fn evaluate(&self, model: &OnlineModel, samples: &[Sample]) -> f64 {
        let mut acc = LossAccumulator::new(model.loss(), self.params.binary_loss);
        for sample in samples {
            acc.add(model.score(sample), sample);
        }
        acc.average()
    }

    fn step<F>(&self, model: &mut OnlineModel, sample: &Sample, acc: &mut LossAccumulator, on_prediction: &mut F) -> ProgressLine
    where
        F: FnMut(&Sample, f64),
    {
        let score = if self.params.test_only {
            model.score(sample)
        } else {
            model.learn_score(sample)
        };
        let prediction = model.link().apply(score);
        acc.add(score, sample);
        on_prediction(sample, prediction);
        ProgressLine {
            average_loss: acc.average(),
            count: acc.count(),
            label: sample.label,
            prediction,
            n_features: sample.n_features(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SparseVector;
    use crate::model::LearnerConfig;
    use approx::assert_abs_diff_eq;

    fn model(learning_rate: f64) -> OnlineModel {
        OnlineModel::new(LearnerConfig::builder().bits(2).learning_rate(learning_rate).build().unwrap()).unwrap()
    }

    /// One feature at index 1. Every tenth sample gets `holdout_label`.
    fn stream(n: u64, holdout_label: f64) -> impl Iterator<Item = Sample> {
        (1..=n).map(move |idx| {
            let label = if idx % 10 == 0 { holdout_label } else { 1.0 };
            Sample::new(label, SparseVector::from_iter([(1, 1.0)]))
        })
    }

    #[test]
    fn single_pass_reports_every_sample() {
        let mut model = model(1.0);
        let mut seen = 0;
        let report = OnlineTrainer::default()
            .run(&mut model, stream(25, 1.0), |_, _| seen += 1)
            .unwrap();
        assert_eq!(seen, 25);
        assert_eq!(report.samples_seen, 25);
        assert_eq!(report.n_train, 25);
        assert_eq!(report.n_holdout, 0);
        assert_eq!(report.passes_completed, 1);
        assert!(report.holdout_losses.is_empty());
        // First sample costs 1, then the weight sits on the label.
        assert_abs_diff_eq!(report.average_loss, 1.0 / 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_only_never_updates() {
        let mut model = model(1.0);
        let params = TrainParams {
            test_only: true,
            ..Default::default()
        };
        let report = OnlineTrainer::new(params).run(&mut model, stream(10, 1.0), |_, p| assert_eq!(p, 0.0)).unwrap();
        assert!(model.weights().is_empty());
        assert_abs_diff_eq!(report.average_loss, 1.0);
    }

    #[test]
    fn holdout_takes_every_period_th_sample() {
        let mut model = model(0.1);
        let params = TrainParams {
            passes: 3,
            ..Default::default()
        };
        let mut seen = 0;
        let report = OnlineTrainer::new(params).run(&mut model, stream(100, 1.0), |_, _| seen += 1).unwrap();
        assert_eq!(report.n_train, 90);
        assert_eq!(report.n_holdout, 10);
        assert_eq!(report.passes_completed, 3);
        assert_eq!(seen, 270);
        assert!(!report.early_stopped);
        assert_eq!(report.holdout_losses.len(), 3);
        assert!(report.holdout_losses.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn stops_when_holdout_loss_rises() {
        // Training pulls the weight towards +1, the holdout wants -1.
        let mut model = model(0.1);
        let params = TrainParams {
            passes: 5,
            ..Default::default()
        };
        let report = OnlineTrainer::new(params).run(&mut model, stream(100, -1.0), |_, _| {}).unwrap();
        assert!(report.early_stopped);
        assert_eq!(report.passes_completed, 2);
        assert_eq!(report.holdout_losses.len(), 2);
        assert!(report.holdout_losses[1] > report.holdout_losses[0]);
    }

    #[test]
    fn empty_holdout_runs_all_passes() {
        let mut model = model(1.0);
        let params = TrainParams {
            passes: 3,
            ..Default::default()
        };
        let report = OnlineTrainer::new(params).run(&mut model, stream(5, 1.0), |_, _| {}).unwrap();
        assert_eq!(report.n_holdout, 0);
        assert_eq!(report.passes_completed, 3);
        assert!(report.holdout_losses.is_empty());
    }

    #[test]
    fn rejects_short_holdout_period() {
        let params = TrainParams {
            holdout_period: 1,
            ..Default::default()
        };
        let err = OnlineTrainer::new(params).run(&mut model(1.0), stream(5, 1.0), |_, _| {}).unwrap_err();
        assert_eq!(err, ConfigError::InvalidHoldoutPeriod(1));
    }

    #[test]
    fn binary_loss_counts_sign_errors() {
        let mut model = model(1.0);
        let params = TrainParams {
            binary_loss: true,
            test_only: true,
            ..Default::default()
        };
        // Score 0 has sign 0, which never equals a ±1 label.
        let report = OnlineTrainer::new(params).run(&mut model, stream(4, 1.0), |_, _| {}).unwrap();
        assert_abs_diff_eq!(report.average_loss, 1.0);
    }
}
