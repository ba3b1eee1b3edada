//! hashlearn: streaming online learning over hashed sparse features.
//!
//! Text lines are parsed into hashed sparse [`Sample`]s, and a single online
//! learner consumes them one at a time. Every learner predicts before it
//! updates, so the running loss is an honest progressive validation estimate.
//!
//! # Key Types
//!
//! - [`parser`]: VW, LIBSVM and TSV line parsers ([`LineParser`], [`ParserConfig`])
//! - [`OnlineModel`] / [`LearnerConfig`]: learner, link and prediction clamp
//! - [`Loss`] / [`Link`]: loss functions and output transformations
//! - [`OnlineTrainer`]: multi-pass driver with holdout and early stopping
//! - [`persist`]: JSON and binary snapshots
//!
//! # Example
//!
//! ```
//! use hashlearn::{LearnerConfig, LineParser, Loss, OnlineModel, ParserConfig};
//! use hashlearn::model::Algorithm;
//!
//! let mut parser = LineParser::from_config(&ParserConfig::default()).unwrap();
//! let config = LearnerConfig::builder()
//!     .algorithm(Algorithm::PerCoordinateCocob)
//!     .loss(Loss::logistic())
//!     .build()
//!     .unwrap();
//! let mut model = OnlineModel::new(config).unwrap();
//!
//! for line in ["1 |f rust fast", "-1 |f slow", "1 |f fast"] {
//!     let sample = parser.parse(line).unwrap();
//!     model.learn(&sample);
//! }
//! ```

// Re-export approx for users who compare predictions
pub use approx;

pub mod data;
pub mod export;
pub mod hashing;
pub mod model;
pub mod parser;
pub mod persist;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::{Sample, SparseVector};
pub use hashing::FeatureHasher;
pub use model::{Algorithm, ConfigError, LearnerConfig, OnlineModel};
pub use parser::{AnyParser, Format, InstanceParser, LineParser, ParseError, ParserConfig};
pub use persist::SnapshotError;
pub use training::{AnyLearner, Learner, Link, Loss, LossFn, OnlineTrainer, TrainParams, TrainReport, Verbosity};
pub use utils::Parallelism;
