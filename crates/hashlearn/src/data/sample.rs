//! Labeled training samples.

use super::SparseVector;

/// Index of the synthetic bias feature every parser appends.
pub const BIAS_INDEX: u32 = 0;

/// One labeled, weighted example.
///
/// - `label`: target value, `0.0` when absent. Binary tasks use `-1` / `+1`.
/// - `weight`: importance multiplier, `1.0` when absent.
/// - `tag`: passthrough identifier, empty when absent.
/// - `features`: hashed feature vector, including the bias at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: f64,
    pub weight: f64,
    pub tag: String,
    pub features: SparseVector,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            label: 0.0,
            weight: 1.0,
            tag: String::new(),
            features: SparseVector::new(),
        }
    }
}

impl Sample {
    /// Sample with the given label and features, default weight and tag.
    pub fn new(label: f64, features: SparseVector) -> Self {
        Self {
            label,
            features,
            ..Default::default()
        }
    }

    /// Set the importance weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Add the bias feature (index 0, value 1.0), overwriting any value that
    /// hashed there.
    pub fn push_bias(&mut self) {
        self.features.put(BIAS_INDEX, 1.0);
    }

    /// Number of stored features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

/// Running statistics over a sample stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleStats {
    /// Samples observed.
    pub count: u64,
    /// Largest squared L2 norm of a feature vector.
    pub max_squared_norm: f64,
}

impl SampleStats {
    /// Fold one sample into the statistics.
    pub fn observe(&mut self, sample: &Sample) {
        self.count += 1;
        self.max_squared_norm = self.max_squared_norm.max(sample.features.squared_l2_norm());
    }
}

impl<'a> FromIterator<&'a Sample> for SampleStats {
    fn from_iter<I: IntoIterator<Item = &'a Sample>>(iter: I) -> Self {
        let mut stats = SampleStats::default();
        for sample in iter {
            stats.observe(sample);
        }
        stats
    }
}
