//! Single-character delimiter tokenizer.
//!
//! A single delimiter at the very start of the input is skipped. After that,
//! every token is the text up to the next delimiter, so two adjacent
//! delimiters produce an empty token. A trailing delimiter does not produce
//! a final empty token.
//!
//! ```
//! use hashlearn::parser::Tokenizer;
//!
//! let tokens: Vec<&str> = Tokenizer::new("  this   ", ' ').collect();
//! assert_eq!(tokens, vec!["", "this", "", ""]);
//! ```

/// Zero-copy iterator over delimiter-separated substrings.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    line: &'a str,
    delim: char,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `line` on `delim`.
    pub fn new(line: &'a str, delim: char) -> Self {
        let pos = if line.starts_with(delim) {
            delim.len_utf8()
        } else {
            0
        };
        Self { line, delim, pos }
    }

    /// Unconsumed remainder of the line.
    #[inline]
    pub fn rest(&self) -> &'a str {
        self.line.get(self.pos..).unwrap_or("")
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.line.len() {
            return None;
        }
        let rest = &self.line[self.pos..];
        match rest.find(self.delim) {
            Some(end) => {
                self.pos += end + self.delim.len_utf8();
                Some(&rest[..end])
            }
            None => {
                self.pos = self.line.len();
                Some(rest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  this   ", ' ', &["", "this", "", ""])]
    #[case(" this is a test ", ' ', &["this", "is", "a", "test"])]
    #[case("a|b||c", '|', &["a", "b", "", "c"])]
    #[case("|ns f", '|', &["ns f"])]
    #[case("", ' ', &[])]
    #[case(" ", ' ', &[])]
    #[case("x\ty", '\t', &["x", "y"])]
    fn splits(#[case] line: &str, #[case] delim: char, #[case] expected: &[&str]) {
        let tokens: Vec<&str> = Tokenizer::new(line, delim).collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn exhausted_stays_exhausted() {
        let mut t = Tokenizer::new("a", ' ');
        assert_eq!(t.next(), Some("a"));
        assert_eq!(t.next(), None);
        assert_eq!(t.next(), None);
    }

    #[test]
    fn multibyte_delimiter_and_content() {
        let tokens: Vec<&str> = Tokenizer::new("é·ü·", '·').collect();
        assert_eq!(tokens, vec!["é", "ü"]);
    }
}
