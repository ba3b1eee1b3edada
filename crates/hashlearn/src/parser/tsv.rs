//! Tab-separated lines described by a declarative column spec.
//!
//! The spec has one line per column:
//!
//! ```text
//! field_name,field_type,namespace[,bin,bin,...]
//! ```
//!
//! `field_type` is one of `0` (categorical), `1` (numeric, binned when bins
//! are given), `2` (numeric, never binned) or `3` (space-separated string
//! tokens). The namespace `label`, `weight`, `tag` or `ignore` gives a column
//! a reserved role instead of hashing it; reserved roles are immune to the
//! namespace ignore list. Bins are increasing borders: a value gets bin
//! `count(border <= value) - 1`, so with borders `177,180` a height below 177
//! lands in bin `-1`, `[177, 180)` in bin `0` and 180 or more in bin `1`.
//!
//! In a data line, an empty field is a missing value and is skipped.

use super::{
    FeatureWriter, InstanceParser, InverseHashMap, NamespaceFilter, ParseError, Tokenizer,
    ZERO_THRESHOLD, parse_number,
};
use crate::data::Sample;
use crate::hashing::FeatureHasher;

/// How a column's values become features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `namespace name_value` → 1.0
    Categorical,
    /// Numeric value, binned into a categorical feature when borders exist.
    Numeric,
    /// Numeric value, always used as-is.
    NumericUnbinned,
    /// Space-separated tokens, one `namespace name_token` feature each.
    Text,
}

impl ColumnKind {
    fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(ColumnKind::Categorical),
            "1" => Some(ColumnKind::Numeric),
            "2" => Some(ColumnKind::NumericUnbinned),
            "3" => Some(ColumnKind::Text),
            _ => None,
        }
    }
}

/// What a column contributes to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Label,
    Weight,
    Tag,
    Ignore,
    Feature,
}

/// One parsed column declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub role: ColumnRole,
    pub namespace: String,
    pub bins: Option<Vec<f64>>,
}

impl ColumnSpec {
    fn parse(line_no: usize, line: &str, filter: &NamespaceFilter) -> Result<Self, ParseError> {
        let invalid = |reason: String| ParseError::InvalidSpec {
            line: line_no,
            reason,
        };

        let mut fields = Tokenizer::new(line, ',');
        let name = fields
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid("missing field name".into()))?;
        let code = fields
            .next()
            .ok_or_else(|| invalid("missing field type".into()))?;
        let kind = ColumnKind::from_code(code)
            .ok_or_else(|| invalid(format!("field type must be 0, 1, 2 or 3, got {code:?}")))?;
        let namespace = fields.next().unwrap_or("");

        let role = match namespace {
            "label" => ColumnRole::Label,
            "weight" => ColumnRole::Weight,
            "tag" => ColumnRole::Tag,
            "ignore" => ColumnRole::Ignore,
            ns if filter.ignores(ns) => ColumnRole::Ignore,
            _ => ColumnRole::Feature,
        };

        let borders = fields
            .map(|b| {
                parse_number(b.trim(), "bin border").map_err(|_| invalid(format!("invalid bin border {b:?}")))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        if borders.windows(2).any(|w| w[0] > w[1]) {
            return Err(invalid("bin borders must be increasing".into()));
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            role,
            namespace: namespace.to_string(),
            bins: (!borders.is_empty()).then_some(borders),
        })
    }

    /// Bin id of `value`: number of borders `<= value`, minus one.
    pub fn bin_of(borders: &[f64], value: f64) -> i64 {
        borders.iter().take_while(|&&b| b <= value).count() as i64 - 1
    }
}

/// Parser for tab-separated lines.
#[derive(Debug, Clone)]
pub struct TsvParser {
    hasher: FeatureHasher,
    columns: Vec<ColumnSpec>,
}

impl TsvParser {
    /// Build a parser from column spec text (columns separated by newlines).
    pub fn new(bits: u32, ignore_namespaces: Option<&str>, spec: &str) -> Result<Self, ParseError> {
        let filter = NamespaceFilter::new(ignore_namespaces);
        let columns = spec
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| ColumnSpec::parse(i + 1, line.trim_end_matches('\r'), &filter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            hasher: FeatureHasher::new(bits),
            columns,
        })
    }

    /// Parsed column declarations.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn hash_column(
        column: &ColumnSpec,
        token: &str,
        writer: &mut FeatureWriter<'_>,
    ) -> Result<(), ParseError> {
        let (ns, name) = (column.namespace.as_str(), column.name.as_str());
        let put_suffixed = |writer: &mut FeatureWriter<'_>, suffix: &str| {
            writer.put(1.0, |key| {
                key.push_str(ns);
                key.push(' ');
                key.push_str(name);
                key.push('_');
                key.push_str(suffix);
            });
        };

        match (column.kind, &column.bins) {
            (ColumnKind::Categorical, _) => put_suffixed(writer, token),
            (ColumnKind::Numeric, Some(borders)) => {
                let value = parse_number(token, "numeric field")?;
                let bin = ColumnSpec::bin_of(borders, value);
                put_suffixed(writer, &bin.to_string());
            }
            (ColumnKind::Numeric, None) | (ColumnKind::NumericUnbinned, _) => {
                let value = parse_number(token, "numeric field")?;
                if value.abs() > ZERO_THRESHOLD {
                    writer.put(value, |key| {
                        key.push_str(ns);
                        key.push(' ');
                        key.push_str(name);
                    });
                }
            }
            (ColumnKind::Text, _) => {
                for word in Tokenizer::new(token, ' ').filter(|w| !w.is_empty()) {
                    put_suffixed(writer, word);
                }
            }
        }
        Ok(())
    }
}

impl InstanceParser for TsvParser {
    fn parse_into(
        &self,
        line: &str,
        inverse: Option<&mut InverseHashMap>,
    ) -> Result<Sample, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut sample = Sample::default();
        let mut writer = FeatureWriter::new(self.hasher, inverse);

        for (pos, token) in Tokenizer::new(line, '\t').enumerate() {
            let column = self.columns.get(pos).ok_or(ParseError::TooManyColumns {
                expected: self.columns.len(),
            })?;
            if token.is_empty() {
                continue;
            }
            match column.role {
                ColumnRole::Ignore => {}
                ColumnRole::Label => sample.label = parse_number(token, "label")?,
                ColumnRole::Weight => sample.weight = parse_number(token, "weight")?,
                ColumnRole::Tag => sample.tag = token.to_string(),
                ColumnRole::Feature => Self::hash_column(column, token, &mut writer)?,
            }
        }

        Ok(writer.finish(sample))
    }

    fn bits(&self) -> u32 {
        self.hasher.bits()
    }

    fn name(&self) -> &'static str {
        "tsv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "name,0,ignore\nmale,1,label\nweight,1,feature\nstrong,0,feature\nlas,0,\npersonality,3,description\nheight,1,feature,177,180";

    fn parse_recording(parser: &TsvParser, line: &str) -> (Sample, InverseHashMap) {
        let mut inverse = InverseHashMap::new();
        let sample = parser.parse_into(line, Some(&mut inverse)).unwrap();
        (sample, inverse)
    }

    fn names(inverse: &InverseHashMap) -> Vec<String> {
        inverse.sorted().into_iter().map(|(_, n)| n.to_string()).collect()
    }

    #[test]
    fn spec_is_parsed() {
        let parser = TsvParser::new(18, None, SPEC).unwrap();
        let cols = parser.columns();
        assert_eq!(cols.len(), 7);
        assert_eq!(cols[0].role, ColumnRole::Ignore);
        assert_eq!(cols[1].role, ColumnRole::Label);
        assert_eq!(cols[2].role, ColumnRole::Feature);
        assert_eq!(cols[4].namespace, "");
        assert_eq!(cols[5].kind, ColumnKind::Text);
        assert_eq!(cols[6].bins.as_deref(), Some(&[177.0, 180.0][..]));
    }

    #[test]
    fn full_line() {
        let parser = TsvParser::new(18, None, SPEC).unwrap();
        let (s, inverse) =
            parse_recording(&parser, "john\t1\t76.0\ttrue\ttrue\toccasional jogger\t150");
        assert_eq!(s.label, 1.0);
        assert!(s.features.values().contains(&76.0));
        let names = names(&inverse);
        for expected in [
            "feature weight",
            "feature strong_true",
            " las_true",
            "description personality_occasional",
            "description personality_jogger",
            "feature height_-1",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[test]
    fn bins_follow_border_count() {
        let parser = TsvParser::new(18, None, SPEC).unwrap();
        for (height, bin) in [("150", "-1"), ("177", "0"), ("178", "0"), ("180", "1"), ("190", "1")] {
            let line = format!("x\t1\t\t\t\t\t{height}");
            let (_, inverse) = parse_recording(&parser, &line);
            let expected = format!("feature height_{bin}");
            assert!(names(&inverse).contains(&expected), "{height} -> {expected}");
        }
    }

    #[test]
    fn missing_values_are_skipped() {
        let parser = TsvParser::new(18, None, SPEC).unwrap();
        let s = parser.parse("janes\t-1\t\t\t\t\t190").unwrap();
        assert_eq!(s.label, -1.0);
        assert_eq!(s.features.len(), 2);
    }

    #[test]
    fn ignored_namespaces() {
        let spec = "name,0,ignore\nmale,1,label\nweight_pounds,1,a\nstrong,0,b\nnum,3,c,177,180\npersonality,1,d";
        let parser = TsvParser::new(18, Some("abc"), spec).unwrap();
        let s = parser.parse("janes\t-1\t100\ttrue\t150\t2").unwrap();
        assert_eq!(s.label, -1.0);
        assert!(s.features.values().contains(&2.0));
        assert_eq!(s.features.len(), 2);
    }

    #[test]
    fn weight_column() {
        let parser = TsvParser::new(18, None, "name,0,ignore\nmale,1,label\nimportance,1,weight").unwrap();
        let s = parser.parse("janes\t-1\t3").unwrap();
        assert_eq!(s.weight, 3.0);
    }

    #[test]
    fn reserved_roles_survive_ignore_list() {
        let spec = "name,0,ignore\nmale,1,label\nimportance,1,weight\nid,0,tag\nx,2,feat";
        let parser = TsvParser::new(18, Some("abclwt"), spec).unwrap();
        let s = parser.parse("janes\t1\t2\tiamthetag\t4").unwrap();
        assert_eq!(s.label, 1.0);
        assert_eq!(s.weight, 2.0);
        assert_eq!(s.tag, "iamthetag");
    }

    #[test]
    fn invalid_specs() {
        assert!(matches!(
            TsvParser::new(18, None, "a,7,ns"),
            Err(ParseError::InvalidSpec { line: 1, .. })
        ));
        assert!(matches!(
            TsvParser::new(18, None, "a,1,ns\nb,1,ns,5,3"),
            Err(ParseError::InvalidSpec { line: 2, .. })
        ));
        assert!(TsvParser::new(18, None, "a").is_err());
    }

    #[test]
    fn extra_columns_are_rejected() {
        let parser = TsvParser::new(18, None, "y,1,label").unwrap();
        assert_eq!(
            parser.parse("1\t2"),
            Err(ParseError::TooManyColumns { expected: 1 })
        );
    }
}
