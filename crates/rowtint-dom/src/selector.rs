//! CSS selector subset used by extraction and location strategies.
//!
//! Supported grammar:
//!
//! ```text
//! selector  = compound (WS+ compound)*
//! compound  = (tag | '*')? (('.' ident) | ('#' ident) | attr)*
//! attr      = '[' ident (op value)? ']'
//! op        = '=' | '*=' | '^=' | '$=' | '~='
//! value     = ident | '"' ... '"' | '\'' ... '\''
//! ```
//!
//! Only the descendant combinator is supported. Child/sibling combinators,
//! selector groups and pseudo-classes are rejected with
//! [`SelectorError::Unsupported`] rather than silently misread.

use std::fmt;
use std::str::FromStr;

use crate::error::SelectorError;

/// A parsed selector.
///
/// The source text is kept so adapters backed by a native selector engine can
/// forward it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    ancestors: Vec<Compound>,
    subject: Compound,
}

/// One compound selector, e.g. `td.yW[email]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    /// Lower-cased tag name, `None` for `*` or no type selector.
    pub tag: Option<String>,
    /// Required id values.
    pub ids: Vec<String>,
    /// Required classes.
    pub classes: Vec<String>,
    /// Attribute conditions.
    pub attributes: Vec<AttributeCondition>,
}

/// An attribute condition inside brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCondition {
    /// Lower-cased attribute name.
    pub name: String,
    /// Operator and operand, `None` for a presence test.
    pub test: Option<(AttributeOperator, String)>,
}

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[a=v]`: exact match.
    Equals,
    /// `[a*=v]`: substring.
    Contains,
    /// `[a^=v]`: prefix.
    Prefix,
    /// `[a$=v]`: suffix.
    Suffix,
    /// `[a~=v]`: whitespace-separated word.
    Word,
}

impl AttributeCondition {
    /// Tests an attribute value (or its absence) against this condition.
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.test {
            None => true,
            Some((AttributeOperator::Equals, expected)) => value == expected,
            // An empty operand never matches for the substring operators.
            Some((_, expected)) if expected.is_empty() => false,
            Some((AttributeOperator::Contains, expected)) => value.contains(expected.as_str()),
            Some((AttributeOperator::Prefix, expected)) => value.starts_with(expected.as_str()),
            Some((AttributeOperator::Suffix, expected)) => value.ends_with(expected.as_str()),
            Some((AttributeOperator::Word, expected)) => {
                value.split_ascii_whitespace().any(|word| word == expected)
            }
        }
    }
}

impl Selector {
    /// Parses a selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the text is empty, malformed, or uses
    /// syntax outside the supported subset.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let (ancestors, subject) = Parser::new(input).parse()?;
        Ok(Self {
            source: input.trim().to_string(),
            ancestors,
            subject,
        })
    }

    /// Returns the selector text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the compounds left of the subject, outermost first.
    #[must_use]
    pub fn ancestors(&self) -> &[Compound] {
        &self.ancestors
    }

    /// Returns the subject compound, the one the matched element must satisfy.
    #[must_use]
    pub const fn subject(&self) -> &Compound {
        &self.subject
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Byte-level selector parser.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Skips whitespace, returning whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: &str) -> SelectorError {
        SelectorError::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn unsupported(&self, message: &str) -> SelectorError {
        SelectorError::Unsupported {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Returns the ancestor compounds and the subject.
    fn parse(mut self) -> Result<(Vec<Compound>, Compound), SelectorError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(SelectorError::Empty);
        }

        let mut compounds = Vec::new();
        loop {
            compounds.push(self.parse_compound()?);
            let separated = self.skip_whitespace();
            let Some(next) = self.peek() else {
                break;
            };
            match next {
                b'>' | b'+' | b'~' => return Err(self.unsupported("only descendant combinators")),
                b',' => return Err(self.unsupported("selector groups")),
                _ if !separated => {
                    return Err(self.error(&format!("unexpected character '{}'", next as char)));
                }
                _ => {}
            }
        }
        let subject = compounds.pop().ok_or(SelectorError::Empty)?;
        Ok((compounds, subject))
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some(b'*') => {
                self.advance();
            }
            Some(b) if is_ident_byte(b) => {
                compound.tag = Some(self.read_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(b'.') => {
                    self.advance();
                    compound.classes.push(self.read_ident()?.to_string());
                }
                Some(b'#') => {
                    self.advance();
                    compound.ids.push(self.read_ident()?.to_string());
                }
                Some(b'[') => {
                    self.advance();
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(b':') => return Err(self.unsupported("pseudo-classes")),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<AttributeCondition, SelectorError> {
        self.skip_whitespace();
        let name = self.read_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match (self.peek(), self.peek_at(1)) {
            (Some(b']'), _) => {
                self.advance();
                return Ok(AttributeCondition { name, test: None });
            }
            (Some(b'='), _) => {
                self.advance();
                AttributeOperator::Equals
            }
            (Some(b'*'), Some(b'=')) => AttributeOperator::Contains,
            (Some(b'^'), Some(b'=')) => AttributeOperator::Prefix,
            (Some(b'$'), Some(b'=')) => AttributeOperator::Suffix,
            (Some(b'~'), Some(b'=')) => AttributeOperator::Word,
            (Some(b'|'), Some(b'=')) => return Err(self.unsupported("'|=' operator")),
            (None, _) => return Err(self.error("unterminated attribute selector")),
            _ => return Err(self.error("expected ']' or an attribute operator")),
        };
        if operator != AttributeOperator::Equals {
            self.pos += 2;
        }

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => self.read_quoted(quote)?,
            Some(b) if is_ident_byte(b) => self.read_ident()?.to_string(),
            _ => return Err(self.error("expected attribute value")),
        };
        self.skip_whitespace();

        match self.advance() {
            Some(b']') => Ok(AttributeCondition {
                name,
                test: Some((operator, value)),
            }),
            Some(_) => Err(self.unsupported("attribute flags")),
            None => Err(self.error("unterminated attribute selector")),
        }
    }

    fn read_ident(&mut self) -> Result<&'a str, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn read_quoted(&mut self, quote: u8) -> Result<String, SelectorError> {
        self.advance();
        let mut value = String::new();
        let mut run_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b) if b == quote => {
                    value.push_str(&self.input[run_start..self.pos]);
                    self.advance();
                    return Ok(value);
                }
                Some(b'\\') => {
                    value.push_str(&self.input[run_start..self.pos]);
                    self.advance();
                    // Escapes are only honoured for ASCII characters.
                    match self.advance() {
                        Some(escaped) if escaped.is_ascii() => value.push(escaped as char),
                        _ => return Err(self.error("invalid escape")),
                    }
                    run_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descendant_chain() {
        let selector = Selector::parse("table[role=\"grid\"] tbody").unwrap();
        assert_eq!(selector.ancestors().len(), 1);

        let table = &selector.ancestors()[0];
        assert_eq!(table.tag.as_deref(), Some("table"));
        assert_eq!(
            table.attributes,
            vec![AttributeCondition {
                name: "role".to_string(),
                test: Some((AttributeOperator::Equals, "grid".to_string())),
            }]
        );
        assert_eq!(selector.subject().tag.as_deref(), Some("tbody"));
        assert_eq!(selector.as_str(), "table[role=\"grid\"] tbody");
    }

    #[test]
    fn test_parse_classes_and_presence() {
        let selector = Selector::parse(".yW span[email]").unwrap();
        let first = &selector.ancestors()[0];
        assert_eq!(first.tag, None);
        assert_eq!(first.classes, vec!["yW".to_string()]);

        let subject = selector.subject();
        assert_eq!(subject.tag.as_deref(), Some("span"));
        assert_eq!(subject.attributes[0].name, "email");
        assert_eq!(subject.attributes[0].test, None);
    }

    #[test]
    fn test_parse_substring_operator() {
        let selector = Selector::parse("td[class*='yW'] span").unwrap();
        let td = &selector.ancestors()[0];
        assert_eq!(
            td.attributes[0].test,
            Some((AttributeOperator::Contains, "yW".to_string()))
        );
    }

    #[test]
    fn test_parse_other_operators() {
        let selector = Selector::parse("[a^=x][b$=y][c~=z]#main").unwrap();
        let subject = selector.subject();
        let ops: Vec<_> = subject
            .attributes
            .iter()
            .map(|a| a.test.as_ref().unwrap().0)
            .collect();
        assert_eq!(
            ops,
            vec![
                AttributeOperator::Prefix,
                AttributeOperator::Suffix,
                AttributeOperator::Word
            ]
        );
        assert_eq!(subject.ids, vec!["main".to_string()]);
    }

    #[test]
    fn test_tag_and_attribute_names_lowercased() {
        let selector = Selector::parse("TR[ROLE=row]").unwrap();
        let subject = selector.subject();
        assert_eq!(subject.tag.as_deref(), Some("tr"));
        assert_eq!(subject.attributes[0].name, "role");
    }

    #[test]
    fn test_quoted_value_with_spaces_and_escape() {
        let selector = Selector::parse(r#"span[title="a \"b\" c"]"#).unwrap();
        assert_eq!(
            selector.subject().attributes[0].test,
            Some((AttributeOperator::Equals, "a \"b\" c".to_string()))
        );
    }

    #[test]
    fn test_single_compound_has_no_ancestors() {
        let selector = Selector::parse("tbody").unwrap();
        assert!(selector.ancestors().is_empty());
        assert_eq!(selector.subject().tag.as_deref(), Some("tbody"));
    }

    #[test]
    fn test_empty_selector() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    }

    #[test]
    fn test_rejects_unsupported_syntax() {
        assert!(matches!(
            Selector::parse("div > span"),
            Err(SelectorError::Unsupported { position: 4, .. })
        ));
        assert!(matches!(
            Selector::parse("a, b"),
            Err(SelectorError::Unsupported { .. })
        ));
        assert!(matches!(
            Selector::parse("tr:hover"),
            Err(SelectorError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            Selector::parse("span[title"),
            Err(SelectorError::Parse { .. })
        ));
        assert!(matches!(
            Selector::parse("span[title=\"x]"),
            Err(SelectorError::Parse { .. })
        ));
        assert!(matches!(
            Selector::parse("span."),
            Err(SelectorError::Parse { position: 5, .. })
        ));
    }

    #[test]
    fn test_attribute_condition_matching() {
        let contains = AttributeCondition {
            name: "class".to_string(),
            test: Some((AttributeOperator::Contains, "yW".to_string())),
        };
        assert!(contains.matches(Some("xY yW zZ")));
        assert!(!contains.matches(Some("yw")));
        assert!(!contains.matches(None));

        let word = AttributeCondition {
            name: "class".to_string(),
            test: Some((AttributeOperator::Word, "zA".to_string())),
        };
        assert!(word.matches(Some("x zA y")));
        assert!(!word.matches(Some("zAB")));

        let empty = AttributeCondition {
            name: "title".to_string(),
            test: Some((AttributeOperator::Prefix, String::new())),
        };
        assert!(!empty.matches(Some("anything")));
    }
}
