//! Vowpal Wabbit style lines.
//!
//! ```text
//! [label] [importance] [tag]|namespace[:weight] feature[:value] ... |namespace2 ...
//! ```
//!
//! The prefix before the first `|` carries the label, the optional
//! importance and the optional tag. A prefix with a single token after the
//! label is a tag unless the prefix ends with a space, in which case it is an
//! importance. Each later segment starts with a namespace (absent when the
//! segment starts with a space) followed by space-separated features. The
//! hash key of a feature is `namespace + " " + name`; its value is the
//! namespace weight times the feature value (default 1).
//!
//! A line without any `|` is a label followed by features in the default
//! (empty) namespace, so `-1.0 a:1` hashes `" a"`.

use super::{
    FeatureWriter, InstanceParser, InverseHashMap, NamespaceFilter, ParseError, Tokenizer,
    ZERO_THRESHOLD, parse_number,
};
use crate::data::Sample;
use crate::hashing::FeatureHasher;

/// Parser for VW-format lines.
#[derive(Debug, Clone)]
pub struct VwParser {
    hasher: FeatureHasher,
    filter: NamespaceFilter,
}

impl VwParser {
    /// Create a parser hashing into `2^bits` slots, dropping namespaces whose
    /// first character appears in `ignore_namespaces`.
    pub fn new(bits: u32, ignore_namespaces: Option<&str>) -> Self {
        Self {
            hasher: FeatureHasher::new(bits),
            filter: NamespaceFilter::new(ignore_namespaces),
        }
    }

    fn parse_prefix(&self, prefix: &str, sample: &mut Sample) -> Result<(), ParseError> {
        let mut tokens = Tokenizer::new(prefix, ' ');

        if !prefix.is_empty() && !prefix.starts_with(' ') {
            if let Some(label) = tokens.next() {
                sample.label = parse_number(label, "label")?;
            }
        }

        let Some(token) = tokens.next() else {
            return Ok(());
        };
        match tokens.next() {
            None if !prefix.ends_with(' ') => sample.tag = token.to_string(),
            next => {
                sample.weight = parse_number(token, "importance")?;
                if let Some(tag) = next {
                    sample.tag = tag.to_string();
                }
            }
        }
        Ok(())
    }

    fn parse_bare(&self, line: &str, sample: &mut Sample, writer: &mut FeatureWriter<'_>) -> Result<(), ParseError> {
        let label = line.split(' ').next().unwrap_or_default();
        if !label.is_empty() {
            sample.label = parse_number(label, "label")?;
        }
        let rest = &line[label.len()..];
        if !rest.is_empty() {
            self.parse_segment(rest, writer)?;
        }
        Ok(())
    }

    fn parse_segment(&self, segment: &str, writer: &mut FeatureWriter<'_>) -> Result<(), ParseError> {
        let mut tokens = Tokenizer::new(segment, ' ');
        let mut namespace = "";
        let mut ns_value = 1.0;

        if !segment.starts_with(' ') {
            let Some(head) = tokens.next() else {
                return Ok(());
            };
            match head.find(':') {
                Some(pos) if pos > 0 => {
                    ns_value = parse_number(&head[pos + 1..], "namespace weight")?;
                    namespace = &head[..pos];
                }
                _ => namespace = head,
            }
            if self.filter.ignores(namespace) {
                return Ok(());
            }
        }

        for token in tokens {
            if token.is_empty() {
                continue;
            }
            match token.find(':') {
                Some(pos) if pos > 0 => {
                    let value = parse_number(&token[pos + 1..], "feature value")?;
                    if value.abs() > ZERO_THRESHOLD {
                        let name = &token[..pos];
                        writer.put(ns_value * value, |key| {
                            key.push_str(namespace);
                            key.push(' ');
                            key.push_str(name);
                        });
                    }
                }
                _ => writer.put(ns_value, |key| {
                    key.push_str(namespace);
                    key.push(' ');
                    key.push_str(token);
                }),
            }
        }
        Ok(())
    }
}

impl InstanceParser for VwParser {
    fn parse_into(
        &self,
        line: &str,
        inverse: Option<&mut InverseHashMap>,
    ) -> Result<Sample, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut sample = Sample::default();
        let mut writer = FeatureWriter::new(self.hasher, inverse);

        match line.split_once('|') {
            Some((prefix, body)) => {
                self.parse_prefix(prefix, &mut sample)?;
                for segment in body.split('|') {
                    if !segment.is_empty() {
                        self.parse_segment(segment, &mut writer)?;
                    }
                }
            }
            None => self.parse_bare(line, &mut sample, &mut writer)?,
        }

        Ok(writer.finish(sample))
    }

    fn bits(&self) -> u32 {
        self.hasher.bits()
    }

    fn name(&self) -> &'static str {
        "vw"
    }
}
