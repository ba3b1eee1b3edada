//! Line parsers turning raw text into hashed [`Sample`]s.
//!
//! Three line formats are supported:
//!
//! - [`VwParser`]: `[label] [importance] [tag] |namespace[:w] feature[:v] ...`
//! - [`LibsvmParser`]: `label feature[:value] ...`
//! - [`TsvParser`]: tab-separated columns described by a declarative column spec
//!
//! Every parser hashes a composed `"namespace feature[_value]"` string with
//! [`FeatureHasher`] and appends the bias feature (index 0, value 1.0).
//!
//! Parsers are immutable and `Sync`, so [`parse_batch`] can hash independent
//! lines on several threads. Recording the inverse hash needs a mutable map
//! and goes through the sequential [`LineParser`].
//!
//! # Example
//!
//! ```
//! use hashlearn::parser::{Format, LineParser, ParserConfig};
//!
//! let config = ParserConfig::builder()
//!     .format(Format::Vw)
//!     .bits(18)
//!     .invert_hash(true)
//!     .build();
//! let mut parser = LineParser::from_config(&config).unwrap();
//!
//! let sample = parser.parse("1 2.0 id7|user age:0.5 premium").unwrap();
//! assert_eq!(sample.label, 1.0);
//! assert_eq!(sample.weight, 2.0);
//! assert_eq!(sample.tag, "id7");
//! assert_eq!(sample.features.len(), 3);
//! assert_eq!(parser.inverse_hash().unwrap().len(), 3);
//! ```

mod inverse;
mod libsvm;
mod tokenizer;
mod tsv;
mod vw;

pub use inverse::{BIAS_NAME, InverseHashMap};
pub use libsvm::LibsvmParser;
pub use tokenizer::Tokenizer;
pub use tsv::{ColumnKind, ColumnRole, ColumnSpec, TsvParser};
pub use vw::VwParser;

use std::str::FromStr;

use bon::Builder;
use thiserror::Error;

use crate::data::{Sample, SparseVector};
use crate::hashing::{DEFAULT_BITS, FeatureHasher};
use crate::utils::Parallelism;

/// Values with magnitude at or below this are dropped while parsing.
pub const ZERO_THRESHOLD: f64 = 1e-10;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced while parsing lines or column specs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A numeric field could not be parsed (or was NaN / infinite).
    #[error("invalid {field} {token:?}")]
    InvalidNumber { field: &'static str, token: String },

    /// A TSV line has more fields than the column spec declares.
    #[error("line has more than the {expected} columns declared by the spec")]
    TooManyColumns { expected: usize },

    /// A column spec line is malformed.
    #[error("column spec line {line}: {reason}")]
    InvalidSpec { line: usize, reason: String },

    /// The TSV format was requested without a column spec.
    #[error("the tsv format requires a column spec")]
    MissingSpec,

    /// Unknown input format name.
    #[error("unknown input format {0:?} (expected vw, libsvm or tsv)")]
    UnknownFormat(String),
}

/// Parse a finite `f64`, reporting the offending token on failure.
pub(crate) fn parse_number(token: &str, field: &'static str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            field,
            token: token.to_string(),
        }),
    }
}

// =============================================================================
// Parser Trait
// =============================================================================

/// A line-format parser.
pub trait InstanceParser: Send + Sync {
    /// Parse one line, recording composed feature names into `inverse` when
    /// given.
    fn parse_into(
        &self,
        line: &str,
        inverse: Option<&mut InverseHashMap>,
    ) -> Result<Sample, ParseError>;

    /// Parse one line without inverse-hash recording.
    fn parse(&self, line: &str) -> Result<Sample, ParseError> {
        self.parse_into(line, None)
    }

    /// Hash table width.
    fn bits(&self) -> u32;

    /// Format name (for logging).
    fn name(&self) -> &'static str;
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Leading characters of namespaces to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceFilter {
    ignored: Vec<char>,
}

impl NamespaceFilter {
    pub fn new(chars: Option<&str>) -> Self {
        Self {
            ignored: chars.map(|s| s.chars().collect()).unwrap_or_default(),
        }
    }

    /// Whether a namespace should be skipped (judged on its first character).
    #[inline]
    pub fn ignores(&self, namespace: &str) -> bool {
        namespace
            .chars()
            .next()
            .is_some_and(|c| self.ignored.contains(&c))
    }

    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty()
    }
}

/// Accumulates hashed features for one line.
///
/// Keys are composed into a reusable buffer to avoid a fresh allocation per
/// feature.
pub(crate) struct FeatureWriter<'a> {
    hasher: FeatureHasher,
    key: String,
    inverse: Option<&'a mut InverseHashMap>,
    features: SparseVector,
}

impl<'a> FeatureWriter<'a> {
    pub(crate) fn new(hasher: FeatureHasher, inverse: Option<&'a mut InverseHashMap>) -> Self {
        Self {
            hasher,
            key: String::with_capacity(64),
            inverse,
            features: SparseVector::new(),
        }
    }

    /// Hash the key produced by `compose` and store `value` at its index.
    #[inline]
    pub(crate) fn put(&mut self, value: f64, compose: impl FnOnce(&mut String)) {
        self.key.clear();
        compose(&mut self.key);
        let idx = self.hasher.hash(&self.key);
        self.features.put(idx, value);
        if let Some(inverse) = self.inverse.as_deref_mut() {
            inverse.record(idx, &self.key);
        }
    }

    /// Finish the line: append the bias and hand the features to `sample`.
    pub(crate) fn finish(self, mut sample: Sample) -> Sample {
        sample.features = self.features;
        sample.push_bias();
        sample
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Supported input formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Vw,
    Libsvm,
    Tsv,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vw" => Ok(Format::Vw),
            "libsvm" => Ok(Format::Libsvm),
            "tsv" => Ok(Format::Tsv),
            other => Err(ParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Parser construction options.
///
/// ```
/// use hashlearn::parser::{Format, ParserConfig};
///
/// let config = ParserConfig::builder()
///     .format(Format::Tsv)
///     .bits(20)
///     .ignore_namespaces("xy")
///     .tsv_spec("label,1,label\nage,2,user")
///     .build();
/// assert_eq!(config.bits, 20);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug))]
pub struct ParserConfig {
    /// Line format. Default: VW.
    #[builder(default)]
    pub format: Format,

    /// Hash table width, clamped to `[1, 31]`. Default: 18.
    #[builder(default = DEFAULT_BITS)]
    pub bits: u32,

    /// Leading characters of namespaces to drop.
    #[builder(into)]
    pub ignore_namespaces: Option<String>,

    /// Record composed feature names for export. Default: false.
    #[builder(default)]
    pub invert_hash: bool,

    /// Column spec for the TSV format.
    #[builder(into)]
    pub tsv_spec: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

// =============================================================================
// AnyParser
// =============================================================================

/// Closed set of parsers, dispatched by `match`.
#[derive(Debug, Clone)]
pub enum AnyParser {
    Vw(VwParser),
    Libsvm(LibsvmParser),
    Tsv(TsvParser),
}

impl AnyParser {
    /// Build the parser described by `config`.
    pub fn from_config(config: &ParserConfig) -> Result<Self, ParseError> {
        let ignore = config.ignore_namespaces.as_deref();
        Ok(match config.format {
            Format::Vw => AnyParser::Vw(VwParser::new(config.bits, ignore)),
            Format::Libsvm => AnyParser::Libsvm(LibsvmParser::new(config.bits)),
            Format::Tsv => {
                let spec = config.tsv_spec.as_deref().ok_or(ParseError::MissingSpec)?;
                AnyParser::Tsv(TsvParser::new(config.bits, ignore, spec)?)
            }
        })
    }
}

impl InstanceParser for AnyParser {
    fn parse_into(
        &self,
        line: &str,
        inverse: Option<&mut InverseHashMap>,
    ) -> Result<Sample, ParseError> {
        match self {
            AnyParser::Vw(p) => p.parse_into(line, inverse),
            AnyParser::Libsvm(p) => p.parse_into(line, inverse),
            AnyParser::Tsv(p) => p.parse_into(line, inverse),
        }
    }

    fn bits(&self) -> u32 {
        match self {
            AnyParser::Vw(p) => p.bits(),
            AnyParser::Libsvm(p) => p.bits(),
            AnyParser::Tsv(p) => p.bits(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyParser::Vw(p) => p.name(),
            AnyParser::Libsvm(p) => p.name(),
            AnyParser::Tsv(p) => p.name(),
        }
    }
}

// =============================================================================
// LineParser
// =============================================================================

/// Sequential front end owning an optional inverse-hash map.
#[derive(Debug, Clone)]
pub struct LineParser {
    parser: AnyParser,
    inverse: Option<InverseHashMap>,
}

impl LineParser {
    pub fn new(parser: AnyParser, invert_hash: bool) -> Self {
        Self {
            parser,
            inverse: invert_hash.then(InverseHashMap::new),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self, ParseError> {
        Ok(Self::new(AnyParser::from_config(config)?, config.invert_hash))
    }

    /// Parse a line, recording feature names when inverse hashing is on.
    pub fn parse(&mut self, line: &str) -> Result<Sample, ParseError> {
        self.parser.parse_into(line, self.inverse.as_mut())
    }

    pub fn parser(&self) -> &AnyParser {
        &self.parser
    }

    /// Recorded names, `None` when inverse hashing is off.
    pub fn inverse_hash(&self) -> Option<&InverseHashMap> {
        self.inverse.as_ref()
    }

    /// Take the recorded names, leaving an empty (bias-only) map behind.
    pub fn take_inverse_hash(&mut self) -> Option<InverseHashMap> {
        self.inverse.as_mut().map(std::mem::take)
    }
}

// =============================================================================
// Batch parsing
// =============================================================================

/// Parse independent lines, in parallel when allowed.
///
/// Results are returned in input order; a malformed line only affects its
/// own slot.
pub fn parse_batch<P, S>(
    parser: &P,
    lines: &[S],
    parallelism: Parallelism,
) -> Vec<Result<Sample, ParseError>>
where
    P: InstanceParser + ?Sized,
    S: AsRef<str> + Sync,
{
    parallelism.maybe_par_map(lines, |line| parser.parse(line.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_rejects_specials() {
        assert_eq!(parse_number("1.5", "label"), Ok(1.5));
        assert_eq!(parse_number("-2e3", "label"), Ok(-2000.0));
        for bad in ["abc", "", "NaN", "inf", "1e400"] {
            assert!(matches!(
                parse_number(bad, "label"),
                Err(ParseError::InvalidNumber { field: "label", .. })
            ));
        }
    }

    #[test]
    fn error_names_the_token() {
        let err = parse_number("x1", "weight").unwrap_err();
        assert_eq!(err.to_string(), "invalid weight \"x1\"");
    }

    #[test]
    fn namespace_filter_uses_first_char() {
        let filter = NamespaceFilter::new(Some("cd"));
        assert!(filter.ignores("cat"));
        assert!(filter.ignores("d"));
        assert!(!filter.ignores("a"));
        assert!(!filter.ignores(""));
        assert!(NamespaceFilter::new(None).is_empty());
    }

    #[test]
    fn format_from_str() {
        assert_eq!("VW".parse::<Format>(), Ok(Format::Vw));
        assert_eq!("libsvm".parse::<Format>(), Ok(Format::Libsvm));
        assert!("csv".parse::<Format>().is_err());
    }

    #[test]
    fn tsv_without_spec_is_rejected() {
        let config = ParserConfig::builder().format(Format::Tsv).build();
        assert!(matches!(
            AnyParser::from_config(&config),
            Err(ParseError::MissingSpec)
        ));
    }

    #[test]
    fn batch_matches_sequential() {
        let parser = AnyParser::from_config(&ParserConfig::default()).unwrap();
        let lines: Vec<String> = (0..200)
            .map(|i| format!("{} |f a{} b:{}", i % 2, i, i + 1))
            .collect();
        let seq = parse_batch(&parser, &lines, Parallelism::Sequential);
        let par = parse_batch(&parser, &lines, Parallelism::Parallel);
        assert_eq!(seq, par);
    }

    #[test]
    fn batch_isolates_bad_lines() {
        let parser = LibsvmParser::new(10);
        let out = parse_batch(&parser, &["1 a:1", "x a:1", "-1 b"], Parallelism::Parallel);
        assert!(out[0].is_ok());
        assert!(out[1].is_err());
        assert!(out[2].is_ok());
    }
}
