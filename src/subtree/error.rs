//! Error types for subtree specification parsing
//!
//! Failures come in three flavours, mirroring the stage that detected them:
//!
//! - [`LexicalErrorKind`]: the tokenizer could not form a token (unknown
//!   character, unterminated string, unbalanced filter block).
//! - [`SyntaxError`]: the tokens do not match the grammar.
//! - [`ValidationError`]: a token was well formed but its value was rejected
//!   by the builder (negative minimum, malformed distinguished name).
//!
//! Internally every stage reports a [`Diagnostic`] (kind + position). The
//! public parser wraps it into a [`ParseError`] that also carries the input
//! that failed.

use super::position::Position;
use thiserror::Error;

/// Errors produced by the tokenizer.
///
/// This is also the logos error type, which is why it needs `Default`: logos
/// yields the default value when no token pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error)]
pub enum LexicalErrorKind {
    #[default]
    #[error("unrecognized input")]
    Unrecognized,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("character {0:?} is not allowed in a quoted string")]
    IllegalStringCharacter(char),
    #[error("filter block is missing a closing parenthesis")]
    UnbalancedFilter,
    #[error("malformed filter block: {0}")]
    MalformedFilter(String),
    #[error("filter nesting exceeds the limit of {0}")]
    FilterTooDeep(usize),
}

/// Grammar errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("invalid filter assertion: {0}")]
    InvalidAssertion(String),
    #[error("unsupported filter assertion {0:?}, only equality is allowed")]
    UnsupportedAssertion(String),
    #[error("component {0:?} appears more than once")]
    DuplicateComponent(&'static str),
    #[error("not requires exactly one refinement, found {0}")]
    NotArity(usize),
    #[error("nesting exceeds the limit of {0}")]
    NestingTooDeep(usize),
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

/// Values rejected by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("minimum base distance must not be negative, got {0}")]
    NegativeMinimum(i64),
    #[error("base distance {0} is out of range")]
    DistanceOutOfRange(i64),
    #[error("invalid distinguished name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}

/// The reason a parse failed, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalErrorKind),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ErrorKind {
    pub fn is_lexical(&self) -> bool {
        matches!(self, ErrorKind::Lexical(_))
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ErrorKind::Syntax(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ErrorKind::Validation(_))
    }
}

/// An error kind pinned to the place it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(kind: impl Into<ErrorKind>, position: Position) -> Self {
        Self {
            kind: kind.into(),
            position,
        }
    }
}

/// Lexical failure with its location, as returned by [`crate::subtree::lexing::tokenize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct LexicalError {
    pub kind: LexicalErrorKind,
    pub position: Position,
}

impl From<LexicalError> for Diagnostic {
    fn from(err: LexicalError) -> Self {
        Diagnostic::new(err.kind, err.position)
    }
}

/// Top-level failure of [`crate::subtree::SubtreeSpecificationParser::parse`].
///
/// Carries the text that was being parsed so callers can log a complete
/// message without keeping the input around themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse subtree specification {input:?}: {}", describe(.kind, .position))]
pub struct ParseError {
    pub input: String,
    pub kind: ErrorKind,
    pub position: Option<Position>,
}

fn describe(kind: &ErrorKind, position: &Option<Position>) -> String {
    match position {
        Some(position) => format!("{} at {}", kind, position),
        None => kind.to_string(),
    }
}

impl ParseError {
    pub fn new(input: impl Into<String>, diagnostic: Diagnostic) -> Self {
        Self {
            input: input.into(),
            kind: diagnostic.kind,
            position: Some(diagnostic.position),
        }
    }

    /// 1-based column of the failure, when known.
    pub fn column(&self) -> Option<usize> {
        self.position.map(|p| p.column)
    }

    /// Human readable message without the input echo.
    pub fn message(&self) -> String {
        describe(&self.kind, &self.position)
    }
}
