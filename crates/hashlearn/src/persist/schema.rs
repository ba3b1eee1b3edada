//! Schema types for learner snapshots.
//!
//! These types describe the serialized form and are kept apart from the
//! runtime learners, so the learners can change their in-memory layout
//! without breaking stored snapshots.
//!
//! Dense tables are stored as [`SparseArraySchema`]: `(index, value)` pairs
//! with zeros omitted. The table size is not stored; the loader supplies it.

use serde::{Deserialize, Serialize};

/// Dense table re-encoded as its non-zero entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseArraySchema {
    /// `(index, value)` pairs in increasing index order.
    pub entries: Vec<(u32, f64)>,
}

/// Loss function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossSchema {
    Squared,
    Absolute,
    Logistic,
    Hinge,
}

/// Link function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSchema {
    Identity,
    Logistic,
}

/// Optimizer state, one variant per algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerStateSchema {
    SgdVw {
        weights: SparseArraySchema,
        scale: SparseArraySchema,
        sum_sq_grads: SparseArraySchema,
        normalizer: f64,
        iteration: u64,
    },
    Solo {
        theta: SparseArraySchema,
        sum_sq_grads: f64,
        scaling: f64,
        iteration: u64,
    },
    PerCoordinateSolo {
        theta: SparseArraySchema,
        sum_sq_grads: SparseArraySchema,
        weights: SparseArraySchema,
        iteration: u64,
    },
    PerCoordinatePistol {
        theta: SparseArraySchema,
        scale: SparseArraySchema,
        sum_abs_grads: SparseArraySchema,
        iteration: u64,
    },
    Kt {
        theta: SparseArraySchema,
        reward: f64,
        steps: f64,
        max_norm_grad: f64,
    },
    PerCoordinateKt {
        reward: SparseArraySchema,
        theta: SparseArraySchema,
        scale: SparseArraySchema,
        steps: SparseArraySchema,
        iteration: u64,
    },
    Cocob {
        theta: SparseArraySchema,
        reward: f64,
        sum_abs_grad_scale: f64,
        max_norm_grad: f64,
        squared_norm_theta: f64,
    },
    PerCoordinateCocob {
        reward: SparseArraySchema,
        theta: SparseArraySchema,
        scale: SparseArraySchema,
        sum_abs_grads: SparseArraySchema,
        iteration: u64,
    },
    FactorizationMachine {
        weights: SparseArraySchema,
        scale: SparseArraySchema,
        sum_sq_grads: SparseArraySchema,
        /// One column per latent factor, indexed by feature.
        factors: Vec<SparseArraySchema>,
        /// AdaGrad accumulators, same layout as `factors`.
        factor_sum_sq_grads: Vec<SparseArraySchema>,
    },
}

/// A learner: its hyperparameters and its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSchema {
    pub loss: LossSchema,
    /// Learning rate, or initial wealth for the coin-betting optimizers.
    pub learning_rate: f64,
    pub state: LearnerStateSchema,
}

/// A complete online model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub learner: LearnerSchema,
    pub link: LinkSchema,
    pub min_prediction: f64,
    pub max_prediction: f64,
}
