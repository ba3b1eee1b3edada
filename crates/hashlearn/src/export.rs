//! Human-oriented outputs: inverse-hash weight dumps and prediction lines.

use std::io::{self, Write};

use crate::data::SparseVector;
use crate::parser::InverseHashMap;

/// Errors raised while writing exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Write one `name:weight` line for every recorded feature that has a weight.
///
/// Lines are sorted by hashed index. Names recorded for indices without a
/// weight are skipped. Returns the number of lines written.
pub fn write_inverse_hash<W: Write>(
    mut writer: W,
    names: &InverseHashMap,
    weights: &SparseVector,
) -> Result<usize, ExportError> {
    let mut written = 0;
    for (index, name) in names.sorted() {
        if !weights.contains(index) {
            continue;
        }
        writeln!(writer, "{}:{}", name, weights.get(index))?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Prediction line: the prediction with six decimals, a space, then the tag.
pub fn format_prediction(prediction: f64, tag: &str) -> String {
    format!("{prediction:.6} {tag}")
}
