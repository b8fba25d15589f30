//! Token definitions for subtree specifications
//!
//! Scanning happens in two layers. [`RawToken`] is the logos scanner: it knows
//! the fixed punctuation and hands the context-sensitive lexemes (quoted
//! strings, numbers, filter blocks) to the callbacks in
//! [`super::scanners`]. The raw token is then classified into a [`TokenKind`],
//! which is where descriptors are looked up in the keyword table.

use super::scanners;
use logos::Logos;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use crate::subtree::error::LexicalErrorKind;

/// State shared with the logos callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerExtras {
    /// Deepest filter block the scanner will follow.
    pub max_nesting_depth: usize,
}

impl Default for LexerExtras {
    fn default() -> Self {
        Self {
            max_nesting_depth: crate::subtree::config::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Whether a digit run turned out to be a plain integer or a dotted OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericForm {
    Integer,
    NumericOid,
}

/// Raw lexemes as recognized by logos.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexicalErrorKind)]
#[logos(extras = LexerExtras)]
pub enum RawToken {
    #[token(" ")]
    Space,
    #[token("{")]
    OpenCurly,
    #[token("}")]
    CloseCurly,
    #[token(",")]
    Sep,
    #[token(":")]
    Colon,

    #[token("\"", scanners::quoted_string)]
    QuotedString,

    #[regex(r"[A-Za-z][A-Za-z0-9\-]*")]
    Descr,

    // The speculative OID extension happens in the callback.
    #[regex(r"-?(0|[1-9][0-9]*)", scanners::numeric)]
    Numeric(NumericForm),

    #[token("(", scanners::filter_block)]
    Filter,
}

/// Reserved words of the subtree specification grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    Base,
    SpecificExclusions,
    ChopBefore,
    ChopAfter,
    Minimum,
    Maximum,
    SpecificationFilter,
    Item,
    And,
    Or,
    Not,
    End,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Base => "base",
            Keyword::SpecificExclusions => "specificExclusions",
            Keyword::ChopBefore => "chopBefore",
            Keyword::ChopAfter => "chopAfter",
            Keyword::Minimum => "minimum",
            Keyword::Maximum => "maximum",
            Keyword::SpecificationFilter => "specificationFilter",
            Keyword::Item => "item",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::End => "end",
        }
    }

    /// Case-sensitive keyword lookup.
    pub fn lookup(text: &str) -> Option<Keyword> {
        KEYWORDS.get(text).copied()
    }
}

const ALL_KEYWORDS: [Keyword; 12] = [
    Keyword::Base,
    Keyword::SpecificExclusions,
    Keyword::ChopBefore,
    Keyword::ChopAfter,
    Keyword::Minimum,
    Keyword::Maximum,
    Keyword::SpecificationFilter,
    Keyword::Item,
    Keyword::And,
    Keyword::Or,
    Keyword::Not,
    Keyword::End,
];

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> =
    Lazy::new(|| ALL_KEYWORDS.iter().map(|k| (k.as_str(), *k)).collect());

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Space,
    OpenCurly,
    CloseCurly,
    Sep,
    Colon,
    SafeUtf8String,
    Descr,
    Keyword(Keyword),
    Integer,
    NumericOid,
    Filter,
    /// Physical end of the input.
    Eof,
}

impl TokenKind {
    pub fn is_space(&self) -> bool {
        matches!(self, TokenKind::Space)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        *self == TokenKind::Keyword(keyword)
    }

    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Space => "space".to_string(),
            TokenKind::OpenCurly => "'{'".to_string(),
            TokenKind::CloseCurly => "'}'".to_string(),
            TokenKind::Sep => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::SafeUtf8String => "quoted string".to_string(),
            TokenKind::Descr => "descriptor".to_string(),
            TokenKind::Keyword(k) => format!("keyword '{}'", k.as_str()),
            TokenKind::Integer => "integer".to_string(),
            TokenKind::NumericOid => "numeric OID".to_string(),
            TokenKind::Filter => "filter".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => write!(f, "Keyword({})", k.as_str()),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Space => TokenKind::Space,
            RawToken::OpenCurly => TokenKind::OpenCurly,
            RawToken::CloseCurly => TokenKind::CloseCurly,
            RawToken::Sep => TokenKind::Sep,
            RawToken::Colon => TokenKind::Colon,
            RawToken::QuotedString => TokenKind::SafeUtf8String,
            RawToken::Descr => TokenKind::Descr,
            RawToken::Numeric(NumericForm::Integer) => TokenKind::Integer,
            RawToken::Numeric(NumericForm::NumericOid) => TokenKind::NumericOid,
            RawToken::Filter => TokenKind::Filter,
        }
    }
}

/// A classified lexeme.
///
/// `text` is the lexeme as the grammar wants it: quoted strings have their
/// quotes removed, every other kind carries its exact source slice. `span`
/// always covers the full source slice, quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Build a token from a logos match, reclassifying keywords.
    pub(crate) fn classify(raw: RawToken, slice: &str, span: Range<usize>) -> Self {
        let kind = match raw {
            RawToken::Descr => Keyword::lookup(slice)
                .map(TokenKind::Keyword)
                .unwrap_or(TokenKind::Descr),
            other => TokenKind::from(other),
        };
        let text = match kind {
            TokenKind::SafeUtf8String => &slice[1..slice.len() - 1],
            _ => slice,
        };
        Self::new(kind, text, span)
    }

    /// What to print when this token is not what the grammar wanted.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Descr | TokenKind::Integer | TokenKind::NumericOid => {
                format!("{} {:?}", self.kind.describe(), self.text)
            }
            _ => self.kind.describe(),
        }
    }
}
