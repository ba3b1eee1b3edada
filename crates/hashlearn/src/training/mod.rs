//! Online training infrastructure.
//!
//! ## Building blocks
//!
//! - [`Loss`]: loss functions with plain and importance-invariant gradients
//! - [`Link`]: output transformation applied to clamped scores
//! - [`Learner`], [`AnyLearner`]: the online optimizers
//!
//! ## Driving a run
//!
//! - [`OnlineTrainer`], [`TrainParams`]: progressive validation, multiple
//!   passes with holdout
//! - [`LossAccumulator`]: weighted running loss and the best constant baseline
//! - [`EarlyStopping`]: stop when the holdout loss goes up
//! - [`TrainingLogger`], [`Verbosity`]: progress output through `log`

mod callback;
mod eval;
pub mod learners;
mod link;
mod logger;
pub mod objectives;
mod trainer;

pub use callback::EarlyStopping;
pub use eval::LossAccumulator;
pub use learners::{
    AnyLearner, Cocob, FactorizationMachine, Kt, Learner, PerCoordinateCocob, PerCoordinateKt, PerCoordinatePistol,
    PerCoordinateSolo, SgdVw, Solo, shrink,
};
pub use link::Link;
pub use logger::{InvalidProgress, ProgressLine, ProgressSchedule, TrainingLogger, Verbosity};
pub use objectives::{AbsoluteLoss, HingeLoss, LogisticLoss, Loss, LossFn, SquaredLoss};
pub use trainer::{OnlineTrainer, TrainParams, TrainReport};
