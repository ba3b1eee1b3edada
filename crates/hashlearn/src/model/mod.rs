//! High-level model types.
//!
//! - [`LearnerConfig`]: validated configuration built with a `bon` builder
//! - [`OnlineModel`]: a learner with its link and prediction clamp, plus
//!   snapshot save/load

mod config;
mod online;

pub use config::{Algorithm, ConfigError, LearnerConfig};
pub use online::OnlineModel;
