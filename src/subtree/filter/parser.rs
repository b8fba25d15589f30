//! Recursive-descent parser for filter blocks
//!
//! Grammar, after the tokenizer has already checked that parentheses balance:
//!
//! ```text
//! filter     = SP* "(" body ")" SP*
//! body       = "&" SP* filter+
//!            / "|" SP* filter+
//!            / "!" SP* filter
//!            / assertion
//! assertion  = attribute "=" value
//! attribute  = descr *(";" option) / numericoid *(";" option)
//! ```
//!
//! Only equality assertions are supported. Values may use RFC 4515 `\XX`
//! escapes; a bare `*` would make the assertion a presence or substring test
//! and is rejected.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::ExprNode;
use crate::subtree::config::DEFAULT_MAX_NESTING_DEPTH;
use crate::subtree::error::{Diagnostic, ErrorKind, LexicalErrorKind, SyntaxError};
use crate::subtree::lexing::cursor::Cursor;
use crate::subtree::position::Position;

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[A-Za-z][A-Za-z0-9\-]*|(?:0|[1-9][0-9]*)(?:\.(?:0|[1-9][0-9]*))+)(?:;[A-Za-z0-9\-]+)*$",
    )
    .expect("attribute pattern is valid")
});

/// Parse a filter with the default nesting limit.
pub fn parse_filter(text: &str) -> Result<ExprNode, Diagnostic> {
    parse_filter_with_limit(text, DEFAULT_MAX_NESTING_DEPTH)
}

/// Parse a filter, failing when blocks nest deeper than `max_depth`.
///
/// Positions in the returned diagnostic are relative to `text`.
pub fn parse_filter_with_limit(text: &str, max_depth: usize) -> Result<ExprNode, Diagnostic> {
    let mut parser = FilterParser {
        source: text,
        cursor: Cursor::new(text),
        max_depth,
    };
    let node = parser.filter(1)?;
    if !parser.cursor.is_at_end() {
        let rest = parser.cursor.rest().to_string();
        return Err(parser.error(SyntaxError::TrailingInput(rest)));
    }
    Ok(node)
}

struct FilterParser<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
    max_depth: usize,
}

impl<'a> FilterParser<'a> {
    fn error(&self, kind: impl Into<ErrorKind>) -> Diagnostic {
        Diagnostic::new(kind, Position::locate(self.source, self.cursor.offset()))
    }

    fn skip_spaces(&mut self) {
        self.cursor.eat_while(|c| c == ' ');
    }

    fn expect(&mut self, ch: char) -> Result<(), Diagnostic> {
        if self.cursor.eat(ch) {
            return Ok(());
        }
        let found = match self.cursor.peek() {
            Some(c) => format!("{:?}", c),
            None => "end of filter".to_string(),
        };
        if ch == ')' && self.cursor.is_at_end() {
            return Err(self.error(LexicalErrorKind::UnbalancedFilter));
        }
        Err(self.error(SyntaxError::UnexpectedToken {
            expected: format!("{:?}", ch),
            found,
        }))
    }

    fn filter(&mut self, depth: usize) -> Result<ExprNode, Diagnostic> {
        if depth > self.max_depth {
            return Err(self.error(SyntaxError::NestingTooDeep(self.max_depth)));
        }

        self.skip_spaces();
        self.expect('(')?;
        let node = match self.cursor.peek() {
            Some('&') => {
                self.cursor.bump();
                ExprNode::and(self.filter_list(depth)?)
            }
            Some('|') => {
                self.cursor.bump();
                ExprNode::or(self.filter_list(depth)?)
            }
            Some('!') => {
                self.cursor.bump();
                ExprNode::not(self.filter(depth + 1)?)
            }
            _ => self.assertion()?,
        };
        self.expect(')')?;
        self.skip_spaces();
        Ok(node)
    }

    /// One or more nested filters.
    fn filter_list(&mut self, depth: usize) -> Result<Vec<ExprNode>, Diagnostic> {
        let mut children = Vec::new();
        loop {
            self.skip_spaces();
            if self.cursor.peek() != Some('(') {
                break;
            }
            children.push(self.filter(depth + 1)?);
        }
        if children.is_empty() {
            return Err(self.error(SyntaxError::UnexpectedToken {
                expected: "nested filter".to_string(),
                found: self
                    .cursor
                    .peek()
                    .map(|c| format!("{:?}", c))
                    .unwrap_or_else(|| "end of filter".to_string()),
            }));
        }
        Ok(children)
    }

    fn assertion(&mut self) -> Result<ExprNode, Diagnostic> {
        let start = self.cursor.mark();
        let attribute_len = self
            .cursor
            .rest()
            .find(|c: char| matches!(c, '=' | '~' | '>' | '<' | ')'))
            .unwrap_or(self.cursor.rest().len());
        let attribute = self.cursor.rest()[..attribute_len].to_string();

        if !ATTRIBUTE.is_match(&attribute) {
            return Err(self.error(SyntaxError::InvalidAssertion(format!(
                "invalid attribute description {:?}",
                attribute
            ))));
        }
        for _ in attribute.chars() {
            self.cursor.bump();
        }

        match self.cursor.peek() {
            Some('=') => {
                self.cursor.bump();
            }
            Some('~' | '>' | '<') => {
                self.cursor.rewind(start);
                let body = self.cursor.rest();
                let body = &body[..body.find(')').unwrap_or(body.len())];
                return Err(self.error(SyntaxError::UnsupportedAssertion(body.to_string())));
            }
            _ => {
                return Err(self.error(SyntaxError::InvalidAssertion(format!(
                    "missing '=' after {:?}",
                    attribute
                ))))
            }
        }

        let value_start = self.cursor.offset();
        let raw_len = self.cursor.rest().find(')').unwrap_or(self.cursor.rest().len());
        let raw = self.cursor.rest()[..raw_len].to_string();

        if raw.contains('*') {
            return Err(self.error(SyntaxError::UnsupportedAssertion(format!(
                "{}={}",
                attribute, raw
            ))));
        }
        let value = unescape_value(&raw).map_err(|reason| {
            Diagnostic::new(
                SyntaxError::InvalidAssertion(reason),
                Position::locate(self.source, value_start),
            )
        })?;
        if value.is_empty() {
            return Err(self.error(SyntaxError::InvalidAssertion(format!(
                "empty value for {:?}",
                attribute
            ))));
        }
        for _ in raw.chars() {
            self.cursor.bump();
        }

        Ok(ExprNode::equality(attribute, value))
    }
}

/// Decode `\XX` escapes into the bytes they stand for.
fn unescape_value(raw: &str) -> Result<String, String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut bytes = Vec::with_capacity(raw.len());
    let mut iter = raw.char_indices();
    while let Some((i, ch)) = iter.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let hex = raw.get(i + 1..i + 3).unwrap_or("");
        let byte = u8::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == 2)
            .ok_or_else(|| format!("invalid escape sequence at byte {}", i))?;
        bytes.push(byte);
        iter.next();
        iter.next();
    }
    String::from_utf8(bytes).map_err(|_| "escaped value is not valid UTF-8".to_string())
}
