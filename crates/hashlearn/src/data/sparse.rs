//! Sparse feature vectors.
//!
//! [`SparseVector`] maps non-negative feature indices to `f64` values. Entries
//! keep their insertion order, so iteration (and therefore floating-point
//! summation order) is deterministic for a given vector. A position map gives
//! O(1) lookups, which the sparse-sparse dot product relies on when it walks
//! the shorter operand and probes the longer one.
//!
//! Dense weight tables are plain `[f64]` slices addressed directly by feature
//! index.
//!
//! # Example
//!
//! ```
//! use hashlearn::data::SparseVector;
//!
//! let mut x = SparseVector::new();
//! x.put(3, 2.0);
//! x.put(0, 1.0);
//!
//! let w = vec![0.5, 0.0, 0.0, 0.25];
//! assert_eq!(x.dot_dense(&w), 1.0);
//! assert_eq!(x.squared_l2_norm(), 5.0);
//! assert_eq!(x.max_index(), Some(3));
//! ```

use std::collections::HashMap;

use approx::{AbsDiffEq, RelativeEq};

/// Insertion-ordered sparse vector with unique indices.
#[derive(Debug, Clone, Default)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f64>,
    positions: HashMap<u32, usize>,
}

impl SparseVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty vector with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the vector has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Value stored at `index`, or `0.0` if the index is absent.
    #[inline]
    pub fn get(&self, index: u32) -> f64 {
        self.positions
            .get(&index)
            .map_or(0.0, |&pos| self.values[pos])
    }

    /// Whether `index` has an entry.
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        self.positions.contains_key(&index)
    }

    /// Stored indices, in insertion order.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Stored values, parallel to [`indices`](Self::indices).
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(index, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Largest stored index, `None` for an empty vector.
    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set `index` to `value`, replacing any previous value.
    ///
    /// Returns the replaced value. A replaced entry keeps its original
    /// position in the iteration order.
    pub fn put(&mut self, index: u32, value: f64) -> Option<f64> {
        match self.positions.get(&index) {
            Some(&pos) => Some(std::mem::replace(&mut self.values[pos], value)),
            None => {
                self.positions.insert(index, self.indices.len());
                self.indices.push(index);
                self.values.push(value);
                None
            }
        }
    }

    /// `self[k] += scale * other[k]` for every entry of `other`.
    ///
    /// Indices missing from `self` are created.
    pub fn add_scaled(&mut self, other: &SparseVector, scale: f64) {
        for (idx, val) in other.iter() {
            match self.positions.get(&idx) {
                Some(&pos) => self.values[pos] += scale * val,
                None => {
                    self.put(idx, scale * val);
                }
            }
        }
    }

    /// Multiply every stored value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    /// `dense[k] += scale * self[k]` for every stored entry.
    ///
    /// # Panics
    ///
    /// Panics if a stored index is outside `dense`.
    #[inline]
    pub fn add_scaled_to_dense(&self, dense: &mut [f64], scale: f64) {
        for (idx, val) in self.iter() {
            dense[idx as usize] += scale * val;
        }
    }

    // =========================================================================
    // Algebra
    // =========================================================================

    /// Sparse-sparse dot product.
    ///
    /// Walks the operand with fewer entries and probes the other one.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (short, long) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        short.iter().map(|(idx, val)| val * long.get(idx)).sum()
    }

    /// Dot product against a dense array. Zero-valued entries are skipped.
    ///
    /// # Panics
    ///
    /// Panics if a stored non-zero index is outside `dense`.
    #[inline]
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (idx, val) in self.iter() {
            if val != 0.0 {
                sum += val * dense[idx as usize];
            }
        }
        sum
    }

    /// Sum of squared values.
    #[inline]
    pub fn squared_l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    // =========================================================================
    // Dense conversion
    // =========================================================================

    /// Dense copy of length `max(min_size, max_index + 1)`.
    pub fn to_dense(&self, min_size: usize) -> Vec<f64> {
        let size = self
            .max_index()
            .map_or(min_size, |m| min_size.max(m as usize + 1));
        let mut dense = vec![0.0; size];
        for (idx, val) in self.iter() {
            dense[idx as usize] = val;
        }
        dense
    }

    /// Sparse copy of the non-zero entries of `dense`, in index order.
    pub fn from_dense(dense: &[f64]) -> Self {
        dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v))
            .collect()
    }

    /// Like [`from_dense`](Self::from_dense), with every value multiplied by
    /// `scale`. Entries are selected on the unscaled value.
    pub fn from_dense_scaled(dense: &[f64], scale: f64) -> Self {
        dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v * scale))
            .collect()
    }
}

impl FromIterator<(u32, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut out = SparseVector::with_capacity(iter.size_hint().0);
        out.extend(iter);
        out
    }
}

impl Extend<(u32, f64)> for SparseVector {
    fn extend<I: IntoIterator<Item = (u32, f64)>>(&mut self, iter: I) {
        for (idx, val) in iter {
            self.put(idx, val);
        }
    }
}

/// Equality ignores insertion order.
impl PartialEq for SparseVector {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(idx, val)| other.contains(idx) && other.get(idx) == val)
    }
}

impl AbsDiffEq for SparseVector {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    /// Absent indices compare as zero.
    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.iter()
            .all(|(idx, val)| val.abs_diff_eq(&other.get(idx), epsilon))
            && other
                .iter()
                .all(|(idx, val)| val.abs_diff_eq(&self.get(idx), epsilon))
    }
}

impl RelativeEq for SparseVector {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.iter()
            .all(|(idx, val)| val.relative_eq(&other.get(idx), epsilon, max_relative))
            && other
                .iter()
                .all(|(idx, val)| val.relative_eq(&self.get(idx), epsilon, max_relative))
    }
}
