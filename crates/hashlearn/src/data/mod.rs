//! Numeric substrate: sparse feature vectors and samples.

mod sample;
mod sparse;

pub use sample::{BIAS_INDEX, Sample, SampleStats};
pub use sparse::SparseVector;
