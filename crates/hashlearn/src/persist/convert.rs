//! Conversions between runtime learners and schema types.
//!
//! Saving is infallible. Restoring needs the table width (`bits`) from the
//! caller and fails when a stored index does not fit the table.

use ndarray::Array2;

use super::SnapshotError;
use super::schema::{LearnerSchema, LearnerStateSchema, LinkSchema, LossSchema, ModelSchema, SparseArraySchema};
use crate::hashing::{clamp_bits, table_size};
use crate::model::OnlineModel;
use crate::training::learners::{
    AnyLearner, Cocob, FactorizationMachine, Kt, Learner, PerCoordinateCocob, PerCoordinateKt,
    PerCoordinatePistol, PerCoordinateSolo, SgdVw, Solo, WeightCache,
};
use crate::training::{Link, Loss};

// =============================================================================
// Dense tables
// =============================================================================

impl SparseArraySchema {
    /// Keep the non-zero entries of `values`, in index order.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v))
            .collect();
        Self { entries }
    }

    /// Largest stored index, if any.
    pub fn max_index(&self) -> Option<u32> {
        self.entries.iter().map(|&(i, _)| i).max()
    }

    /// Re-inflate to a dense table of `size` entries.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::IndexOutOfRange`] if an entry does not fit.
    pub fn inflate(&self, size: usize) -> Result<Vec<f64>, SnapshotError> {
        let mut dense = vec![0.0; size];
        for &(index, value) in &self.entries {
            let slot = dense.get_mut(index as usize).ok_or(SnapshotError::IndexOutOfRange {
                index,
                table_size: size,
            })?;
            *slot = value;
        }
        Ok(dense)
    }
}

impl From<&[f64]> for SparseArraySchema {
    fn from(values: &[f64]) -> Self {
        Self::from_values(values)
    }
}

fn encode_columns(matrix: &Array2<f64>) -> Vec<SparseArraySchema> {
    matrix.columns().into_iter().map(|column| SparseArraySchema::from_values(column.iter())).collect()
}

fn inflate_columns(columns: &[SparseArraySchema], size: usize) -> Result<Array2<f64>, SnapshotError> {
    let mut matrix = Array2::zeros((size, columns.len()));
    for (f, column) in columns.iter().enumerate() {
        for &(index, value) in &column.entries {
            if index as usize >= size {
                return Err(SnapshotError::IndexOutOfRange { index, table_size: size });
            }
            matrix[[index as usize, f]] = value;
        }
    }
    Ok(matrix)
}

// =============================================================================
// Loss and link
// =============================================================================

impl From<Loss> for LossSchema {
    fn from(loss: Loss) -> Self {
        match loss {
            Loss::SquaredLoss(_) => Self::Squared,
            Loss::AbsoluteLoss(_) => Self::Absolute,
            Loss::LogisticLoss(_) => Self::Logistic,
            Loss::HingeLoss(_) => Self::Hinge,
        }
    }
}

impl From<LossSchema> for Loss {
    fn from(schema: LossSchema) -> Self {
        match schema {
            LossSchema::Squared => Loss::squared(),
            LossSchema::Absolute => Loss::absolute(),
            LossSchema::Logistic => Loss::logistic(),
            LossSchema::Hinge => Loss::hinge(),
        }
    }
}

impl From<Link> for LinkSchema {
    fn from(link: Link) -> Self {
        match link {
            Link::Identity => Self::Identity,
            Link::Logistic => Self::Logistic,
        }
    }
}

impl From<LinkSchema> for Link {
    fn from(schema: LinkSchema) -> Self {
        match schema {
            LinkSchema::Identity => Link::Identity,
            LinkSchema::Logistic => Link::Logistic,
        }
    }
}

// =============================================================================
// Learners
// =============================================================================

impl From<&AnyLearner> for LearnerStateSchema {
    fn from(learner: &AnyLearner) -> Self {
        let dense = |values: &[f64]| SparseArraySchema::from(values);
        match learner {
            AnyLearner::SgdVw(l) => Self::SgdVw {
                weights: dense(&l.weights),
                scale: dense(&l.scale),
                sum_sq_grads: dense(&l.sum_sq_grads),
                normalizer: l.normalizer,
                iteration: l.iteration,
            },
            AnyLearner::Solo(l) => Self::Solo {
                theta: dense(&l.theta),
                sum_sq_grads: l.sum_sq_grads,
                scaling: l.scaling,
                iteration: l.iteration,
            },
            AnyLearner::PerCoordinateSolo(l) => Self::PerCoordinateSolo {
                theta: dense(&l.theta),
                sum_sq_grads: dense(&l.sum_sq_grads),
                weights: dense(&l.weights),
                iteration: l.iteration,
            },
            AnyLearner::PerCoordinatePistol(l) => Self::PerCoordinatePistol {
                theta: dense(&l.theta),
                scale: dense(&l.scale),
                sum_abs_grads: dense(&l.sum_abs_grads),
                iteration: l.iteration,
            },
            AnyLearner::Kt(l) => Self::Kt {
                theta: dense(&l.theta),
                reward: l.reward,
                steps: l.steps,
                max_norm_grad: l.max_norm_grad,
            },
            AnyLearner::PerCoordinateKt(l) => Self::PerCoordinateKt {
                reward: dense(&l.reward),
                theta: dense(&l.theta),
                scale: dense(&l.scale),
                steps: dense(&l.steps),
                iteration: l.iteration,
            },
            AnyLearner::Cocob(l) => Self::Cocob {
                theta: dense(&l.theta),
                reward: l.reward,
                sum_abs_grad_scale: l.sum_abs_grad_scale,
                max_norm_grad: l.max_norm_grad,
                squared_norm_theta: l.squared_norm_theta,
            },
            AnyLearner::PerCoordinateCocob(l) => Self::PerCoordinateCocob {
                reward: dense(&l.reward),
                theta: dense(&l.theta),
                scale: dense(&l.scale),
                sum_abs_grads: dense(&l.sum_abs_grads),
                iteration: l.iteration,
            },
            AnyLearner::FactorizationMachine(l) => Self::FactorizationMachine {
                weights: dense(&l.weights),
                scale: dense(&l.scale),
                sum_sq_grads: dense(&l.sum_sq_grads),
                factors: encode_columns(&l.factors),
                factor_sum_sq_grads: encode_columns(&l.factor_sum_sq_grads),
            },
        }
    }
}

impl From<&AnyLearner> for LearnerSchema {
    fn from(learner: &AnyLearner) -> Self {
        Self {
            loss: learner.loss().into(),
            learning_rate: learner.learning_rate(),
            state: learner.into(),
        }
    }
}

impl LearnerSchema {
    /// Rebuild the learner on a table of `2^bits` entries.
    ///
    /// `bits` is clamped to `[1, 31]` like everywhere else.
    pub fn restore(self, bits: u32) -> Result<AnyLearner, SnapshotError> {
        let bits = clamp_bits(bits);
        let size = table_size(bits);
        let loss = Loss::from(self.loss);
        let eta = self.learning_rate;

        let learner = match self.state {
            LearnerStateSchema::SgdVw {
                weights,
                scale,
                sum_sq_grads,
                normalizer,
                iteration,
            } => AnyLearner::SgdVw(SgdVw {
                bits,
                loss,
                eta,
                weights: weights.inflate(size)?,
                scale: scale.inflate(size)?,
                sum_sq_grads: sum_sq_grads.inflate(size)?,
                normalizer,
                iteration,
            }),
            LearnerStateSchema::Solo {
                theta,
                sum_sq_grads,
                scaling,
                iteration,
            } => AnyLearner::Solo(Solo {
                bits,
                loss,
                eta,
                theta: theta.inflate(size)?,
                sum_sq_grads,
                scaling,
                iteration,
            }),
            LearnerStateSchema::PerCoordinateSolo {
                theta,
                sum_sq_grads,
                weights,
                iteration,
            } => AnyLearner::PerCoordinateSolo(PerCoordinateSolo {
                bits,
                loss,
                eta,
                theta: theta.inflate(size)?,
                sum_sq_grads: sum_sq_grads.inflate(size)?,
                weights: weights.inflate(size)?,
                iteration,
            }),
            LearnerStateSchema::PerCoordinatePistol {
                theta,
                scale,
                sum_abs_grads,
                iteration,
            } => AnyLearner::PerCoordinatePistol(PerCoordinatePistol {
                bits,
                loss,
                eta,
                theta: theta.inflate(size)?,
                scale: scale.inflate(size)?,
                sum_abs_grads: sum_abs_grads.inflate(size)?,
                iteration,
                cache: WeightCache::default(),
            }),
            LearnerStateSchema::Kt {
                theta,
                reward,
                steps,
                max_norm_grad,
            } => AnyLearner::Kt(Kt {
                bits,
                loss,
                initial_wealth: eta,
                theta: theta.inflate(size)?,
                reward,
                steps,
                max_norm_grad,
            }),
            LearnerStateSchema::PerCoordinateKt {
                reward,
                theta,
                scale,
                steps,
                iteration,
            } => AnyLearner::PerCoordinateKt(PerCoordinateKt {
                bits,
                loss,
                initial_wealth: eta,
                reward: reward.inflate(size)?,
                theta: theta.inflate(size)?,
                scale: scale.inflate(size)?,
                steps: steps.inflate(size)?,
                iteration,
                cache: WeightCache::default(),
            }),
            LearnerStateSchema::Cocob {
                theta,
                reward,
                sum_abs_grad_scale,
                max_norm_grad,
                squared_norm_theta,
            } => AnyLearner::Cocob(Cocob {
                bits,
                loss,
                initial_wealth: eta,
                theta: theta.inflate(size)?,
                reward,
                sum_abs_grad_scale,
                max_norm_grad,
                squared_norm_theta,
            }),
            LearnerStateSchema::PerCoordinateCocob {
                reward,
                theta,
                scale,
                sum_abs_grads,
                iteration,
            } => AnyLearner::PerCoordinateCocob(PerCoordinateCocob {
                bits,
                loss,
                initial_wealth: eta,
                reward: reward.inflate(size)?,
                theta: theta.inflate(size)?,
                scale: scale.inflate(size)?,
                sum_abs_grads: sum_abs_grads.inflate(size)?,
                iteration,
                cache: WeightCache::default(),
            }),
            LearnerStateSchema::FactorizationMachine {
                weights,
                scale,
                sum_sq_grads,
                factors,
                factor_sum_sq_grads,
            } => {
                if factors.is_empty() {
                    return Err(SnapshotError::ArrayLength {
                        field: "factors",
                        expected: 1,
                        actual: 0,
                    });
                }
                if factor_sum_sq_grads.len() != factors.len() {
                    return Err(SnapshotError::ArrayLength {
                        field: "factor_sum_sq_grads",
                        expected: factors.len(),
                        actual: factor_sum_sq_grads.len(),
                    });
                }
                AnyLearner::FactorizationMachine(FactorizationMachine {
                    bits,
                    loss,
                    eta,
                    n_factors: factors.len(),
                    weights: weights.inflate(size)?,
                    scale: scale.inflate(size)?,
                    sum_sq_grads: sum_sq_grads.inflate(size)?,
                    factors: inflate_columns(&factors, size)?,
                    factor_sum_sq_grads: inflate_columns(&factor_sum_sq_grads, size)?,
                })
            }
        };
        Ok(learner)
    }
}

// =============================================================================
// Model
// =============================================================================

impl From<&OnlineModel> for ModelSchema {
    fn from(model: &OnlineModel) -> Self {
        let (min_prediction, max_prediction) = model.prediction_range();
        Self {
            learner: model.learner().into(),
            link: model.link().into(),
            min_prediction,
            max_prediction,
        }
    }
}

impl ModelSchema {
    /// Rebuild the model on a table of `2^bits` entries.
    pub fn restore(self, bits: u32) -> Result<OnlineModel, SnapshotError> {
        let learner = self.learner.restore(bits)?;
        Ok(OnlineModel::from_parts(
            learner,
            self.link.into(),
            self.min_prediction,
            self.max_prediction,
        ))
    }
}
