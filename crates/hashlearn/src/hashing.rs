//! Feature hashing.
//!
//! Every parser maps a composed feature string (`"namespace feature"` or
//! `"namespace feature_value"`) to a slot of a fixed-size weight table with the
//! 128-bit x64 MurmurHash3 variant. Only the low `bits` bits of the hash are
//! kept, so distinct strings may share a slot. Such collisions are accepted:
//! colliding features silently share a weight.
//!
//! # Example
//!
//! ```
//! use hashlearn::hashing::FeatureHasher;
//!
//! let hasher = FeatureHasher::new(18);
//! let idx = hasher.hash("a feature");
//! assert!(idx < hasher.table_size() as u32);
//! ```

use std::io::Cursor;

use murmur3::murmur3_x64_128;

/// Smallest supported table width.
pub const MIN_BITS: u32 = 1;

/// Largest supported table width.
pub const MAX_BITS: u32 = 31;

/// Default table width (`2^18` slots).
pub const DEFAULT_BITS: u32 = 18;

const HASH_SEED: u32 = 0;

/// Clamp a requested table width into `[MIN_BITS, MAX_BITS]`.
///
/// Out-of-range widths are not an error: they are moved to the nearest bound.
#[inline]
pub fn clamp_bits(bits: u32) -> u32 {
    bits.clamp(MIN_BITS, MAX_BITS)
}

/// Number of slots of a table with the given width (after clamping).
#[inline]
pub fn table_size(bits: u32) -> usize {
    1usize << clamp_bits(bits)
}

/// Masked MurmurHash3 string hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureHasher {
    bits: u32,
    mask: u32,
}

impl FeatureHasher {
    /// Create a hasher producing indices in `[0, 2^bits)`.
    pub fn new(bits: u32) -> Self {
        let bits = clamp_bits(bits);
        Self {
            bits,
            mask: ((1u64 << bits) - 1) as u32,
        }
    }

    /// Table width in bits.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Bit mask applied to raw hashes.
    #[inline]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of addressable slots.
    #[inline]
    pub fn table_size(&self) -> usize {
        1usize << self.bits
    }

    /// Hash a composed feature string to a table index.
    #[inline]
    pub fn hash(&self, key: &str) -> u32 {
        raw_hash(key.as_bytes()) & self.mask
    }
}

impl Default for FeatureHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BITS)
    }
}

/// Low 32 bits of the x64 128-bit MurmurHash3 of `bytes`.
#[inline]
pub fn raw_hash(bytes: &[u8]) -> u32 {
    // Reading from an in-memory cursor cannot fail.
    let hash = murmur3_x64_128(&mut Cursor::new(bytes), HASH_SEED).unwrap_or_default();
    hash as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_clamped() {
        assert_eq!(FeatureHasher::new(0).bits(), 1);
        assert_eq!(FeatureHasher::new(40).bits(), 31);
        assert_eq!(FeatureHasher::new(18).mask(), (1 << 18) - 1);
        assert_eq!(table_size(0), 2);
        assert_eq!(table_size(64), 1 << 31);
    }

    #[test]
    fn hash_is_deterministic_and_masked() {
        let hasher = FeatureHasher::new(18);
        let mut max = 0;
        for i in 0..10_000 {
            let key = format!("ns feature_{i}");
            let a = hasher.hash(&key);
            assert_eq!(a, hasher.hash(&key));
            max = max.max(a);
        }
        assert!(max <= hasher.mask());
    }

    #[test]
    fn hash_spreads_over_table() {
        let hasher = FeatureHasher::new(4);
        let mut seen = [false; 16];
        for i in 0..1_000 {
            seen[hasher.hash(&format!("x {i}")) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn namespace_is_part_of_key() {
        let hasher = FeatureHasher::new(24);
        assert_ne!(hasher.hash("a f"), hasher.hash("b f"));
    }
}
