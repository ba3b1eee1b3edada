//! Learner snapshots.
//!
//! Two encodings of the same [`ModelSchema`](schema::ModelSchema) record:
//!
//! - JSON via `serde_json`, for inspection and interchange
//! - a compact binary format (header + Postcard payload, see [`native`])
//!
//! Neither stores the table size. Every loader takes `bits` and inflates the
//! zero-omitted tables to `2^bits` entries, failing with
//! [`SnapshotError::IndexOutOfRange`] if an entry does not fit.
//!
//! JSON keeps floats to their shortest round-trip representation, but only the
//! binary format guarantees bit-identical state after a reload.

mod convert;
pub mod native;
pub mod schema;

use std::io::{Read, Write};

use thiserror::Error;

use crate::model::OnlineModel;
use crate::training::learners::AnyLearner;
use schema::{LearnerSchema, ModelSchema};

/// Errors raised while saving or loading snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A stored index does not fit the table size supplied by the loader.
    #[error("index {index} is out of range for a table of {table_size} entries")]
    IndexOutOfRange { index: u32, table_size: usize },

    /// Two parallel arrays disagree in length.
    #[error("{field} has {actual} columns, expected {expected}")]
    ArrayLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("not a hashlearn snapshot")]
    NotASnapshot,

    #[error("snapshot requires format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("snapshot truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Models
// =============================================================================

/// Write `model` as pretty-printed JSON.
pub fn write_json<W: Write>(model: &OnlineModel, writer: W) -> Result<(), SnapshotError> {
    serde_json::to_writer_pretty(writer, &ModelSchema::from(model))?;
    Ok(())
}

/// Read a JSON model snapshot onto a table of `2^bits` entries.
pub fn read_json<R: Read>(reader: R, bits: u32) -> Result<OnlineModel, SnapshotError> {
    let schema: ModelSchema = serde_json::from_reader(reader)?;
    schema.restore(bits)
}

/// Encode `model` in the binary format.
pub fn to_bytes(model: &OnlineModel) -> Result<Vec<u8>, SnapshotError> {
    native::encode(ModelSchema::from(model), model.algorithm(), model.bits())
}

/// Decode a binary model snapshot onto a table of `2^bits` entries.
pub fn from_bytes(bytes: &[u8], bits: u32) -> Result<OnlineModel, SnapshotError> {
    let (header, schema) = native::decode(bytes)?;
    if u32::from(header.bits) != bits {
        log::warn!("snapshot was saved with {} bits, loading with {bits}", header.bits);
    }
    let model = schema.restore(bits)?;
    if model.algorithm() != header.algorithm {
        log::warn!(
            "snapshot header names {}, payload holds {}",
            header.algorithm,
            model.algorithm()
        );
    }
    Ok(model)
}

// =============================================================================
// Bare learners
// =============================================================================

/// Write a single learner (no link, no clamp) as JSON.
pub fn write_learner_json<W: Write>(learner: &AnyLearner, writer: W) -> Result<(), SnapshotError> {
    serde_json::to_writer_pretty(writer, &LearnerSchema::from(learner))?;
    Ok(())
}

/// Read a single learner written by [`write_learner_json`].
pub fn read_learner_json<R: Read>(reader: R, bits: u32) -> Result<AnyLearner, SnapshotError> {
    let schema: LearnerSchema = serde_json::from_reader(reader)?;
    schema.restore(bits)
}
