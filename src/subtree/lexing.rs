//! Tokenizer for subtree specifications
//!
//! The token set follows RFC 3672 closely. Two choices shape everything
//! downstream:
//!
//! - Spaces are tokens. The grammar consumes them explicitly wherever the RFC
//!   allows optional or mandatory whitespace, so placement is enforced by the
//!   parser rather than guessed by the lexer.
//! - Tokens are produced one at a time from an offset, see [`scan_token`].
//!   Nothing about the lexer outlives a call, which is what lets a
//!   [`crate::subtree::session::Session`] be reset and reused cheaply.
//!
//! The scanning itself is logos ([`tokens::RawToken`]) with callbacks for
//! quoted strings, the integer / numeric OID ambiguity and balanced filter
//! blocks ([`scanners`]).

pub mod char_classes;
pub mod cursor;
pub mod scanners;
pub mod tokens;

pub use tokens::{Keyword, LexerExtras, Token, TokenKind};

use logos::Logos;
use tracing::trace;

use crate::subtree::error::{LexicalError, LexicalErrorKind};
use crate::subtree::position::Position;
use tokens::RawToken;

/// Scan the token that starts at `offset`.
///
/// Returns [`TokenKind::Eof`] with an empty span at the end of the input.
pub fn scan_token(
    source: &str,
    offset: usize,
    extras: LexerExtras,
) -> Result<Token, LexicalError> {
    let rest = &source[offset..];
    let mut lexer = RawToken::lexer_with_extras(rest, extras);

    match lexer.next() {
        None => Ok(Token::new(TokenKind::Eof, "", source.len()..source.len())),
        Some(Ok(raw)) => {
            let span = lexer.span();
            let token = Token::classify(raw, lexer.slice(), offset + span.start..offset + span.end);
            trace!(kind = %token.kind, text = %token.text, "scanned token");
            Ok(token)
        }
        Some(Err(kind)) => {
            let span = lexer.span();
            let (kind, at) = match kind {
                LexicalErrorKind::Unrecognized => {
                    let ch = rest[span.start..].chars().next().unwrap_or('\u{0}');
                    (LexicalErrorKind::UnexpectedCharacter(ch), span.start)
                }
                // Callbacks bump up to the character that stopped them.
                other => (other, span.end),
            };
            Err(LexicalError {
                kind,
                position: Position::locate(source, offset + at),
            })
        }
    }
}

/// Iterator over the tokens of a borrowed string.
///
/// Yields tokens up to, but not including, [`TokenKind::Eof`]. Iteration stops
/// after the first error.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    source: &'a str,
    offset: usize,
    extras: LexerExtras,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_extras(source, LexerExtras::default())
    }

    pub fn with_extras(source: &'a str, extras: LexerExtras) -> Self {
        Self {
            source,
            offset: 0,
            extras,
            done: false,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match scan_token(self.source, self.offset, self.extras) {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.done = true;
                None
            }
            Ok(token) => {
                self.offset = token.span.end;
                Some(Ok(token))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Convenience function to tokenize a whole string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexicalError> {
    Tokenizer::new(source).collect()
}

/// Tokenize and keep only the kinds.
pub fn tokenize_kinds(source: &str) -> Result<Vec<TokenKind>, LexicalError> {
    Ok(tokenize(source)?.into_iter().map(|t| t.kind).collect())
}
