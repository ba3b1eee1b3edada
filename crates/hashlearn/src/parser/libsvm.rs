//! LIBSVM style lines: `label feature[:value] feature[:value] ...`.
//!
//! Feature names are hashed as-is (no namespace). A token without `:value`
//! counts as 1.0; values with magnitude below [`ZERO_THRESHOLD`] are dropped.

use super::{
    FeatureWriter, InstanceParser, InverseHashMap, ParseError, Tokenizer, ZERO_THRESHOLD,
    parse_number,
};
use crate::data::Sample;
use crate::hashing::FeatureHasher;

/// Parser for LIBSVM-format lines.
#[derive(Debug, Clone)]
pub struct LibsvmParser {
    hasher: FeatureHasher,
}

impl LibsvmParser {
    pub fn new(bits: u32) -> Self {
        Self {
            hasher: FeatureHasher::new(bits),
        }
    }
}

impl InstanceParser for LibsvmParser {
    fn parse_into(
        &self,
        line: &str,
        inverse: Option<&mut InverseHashMap>,
    ) -> Result<Sample, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut tokens = Tokenizer::new(line, ' ');
        let sample = Sample {
            label: parse_number(tokens.next().unwrap_or(""), "label")?,
            ..Default::default()
        };
        let mut writer = FeatureWriter::new(self.hasher, inverse);

        for token in tokens {
            if token.is_empty() {
                continue;
            }
            match token.find(':') {
                Some(pos) if pos > 0 => {
                    let value = parse_number(&token[pos + 1..], "feature value")?;
                    if value.abs() > ZERO_THRESHOLD {
                        writer.put(value, |key| key.push_str(&token[..pos]));
                    }
                }
                _ => writer.put(1.0, |key| key.push_str(token)),
            }
        }

        Ok(writer.finish(sample))
    }

    fn bits(&self) -> u32 {
        self.hasher.bits()
    }

    fn name(&self) -> &'static str {
        "libsvm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_and_single_feature() {
        let s = LibsvmParser::new(18).parse("-1.0 a:1").unwrap();
        assert_eq!(s.label, -1.0);
        assert_eq!(s.weight, 1.0);
        assert_eq!(s.features.len(), 2);
        assert_eq!(s.features.get(0), 1.0);
    }

    #[test]
    fn bare_tokens_count_as_one() {
        let hasher = FeatureHasher::new(18);
        let s = LibsvmParser::new(18).parse("-1 1:27 2_Private").unwrap();
        assert_eq!(s.features.len(), 3);
        assert_eq!(s.features.get(hasher.hash("1")), 27.0);
        assert_eq!(s.features.get(hasher.hash("2_Private")), 1.0);
    }

    #[test]
    fn zero_values_are_dropped() {
        let s = LibsvmParser::new(18).parse("1 a:0 b:0.0 c:2").unwrap();
        assert_eq!(s.features.len(), 2);
    }

    #[test]
    fn empty_line_is_an_error() {
        assert!(LibsvmParser::new(18).parse("").is_err());
        assert!(LibsvmParser::new(18).parse("1 a:x").is_err());
    }
}
