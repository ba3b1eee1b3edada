//! Inverse-hash recording.

use std::collections::HashMap;

use crate::data::BIAS_INDEX;

/// Name recorded for the bias slot.
pub const BIAS_NAME: &str = "bias_term";

/// Map from hashed index back to the composed feature string.
///
/// Lossy: when two strings hash to the same index, the last one parsed wins.
/// Only meant for diagnostics and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseHashMap {
    names: HashMap<u32, String>,
}

impl Default for InverseHashMap {
    fn default() -> Self {
        Self::new()
    }
}

impl InverseHashMap {
    /// Map with the bias slot pre-recorded.
    pub fn new() -> Self {
        let mut names = HashMap::new();
        names.insert(BIAS_INDEX, BIAS_NAME.to_string());
        Self { names }
    }

    /// Record `name` for `index`, replacing an earlier name.
    #[inline]
    pub fn record(&mut self, index: u32, name: &str) {
        match self.names.get_mut(&index) {
            Some(existing) if existing == name => {}
            Some(existing) => {
                existing.clear();
                existing.push_str(name);
            }
            None => {
                self.names.insert(index, name.to_string());
            }
        }
    }

    /// Recorded name of `index`.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.names.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries sorted by index.
    pub fn sorted(&self) -> Vec<(u32, &str)> {
        let mut entries: Vec<(u32, &str)> = self
            .names
            .iter()
            .map(|(&idx, name)| (idx, name.as_str()))
            .collect();
        entries.sort_unstable_by_key(|&(idx, _)| idx);
        entries
    }

    /// Merge another map into this one. Entries of `other` win on conflict.
    pub fn merge(&mut self, other: InverseHashMap) {
        self.names.extend(other.names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_is_preseeded() {
        let map = InverseHashMap::new();
        assert_eq!(map.get(0), Some("bias_term"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn later_names_overwrite() {
        let mut map = InverseHashMap::new();
        map.record(7, "a x");
        map.record(7, "b y");
        assert_eq!(map.get(7), Some("b y"));
        assert_eq!(map.sorted(), vec![(0, "bias_term"), (7, "b y")]);
    }
}
