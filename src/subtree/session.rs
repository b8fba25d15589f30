//! Reusable parser
//!
//! [`Session`] owns everything a parse needs between tokens: the input
//! buffer, the read offset and the one-token lookahead. A session is reset in
//! full at the start of every parse, so nothing from a previous input can be
//! observed by the next one.
//!
//! [`SubtreeSpecificationParser`] keeps one session behind a mutex. It can be
//! shared between threads; calls are serialized.

use std::sync::Mutex;
use tracing::debug;

use super::config::ParserConfig;
use super::error::{Diagnostic, ParseError};
use super::lexing::{scan_token, LexerExtras, Token};
use super::model::SubtreeSpecification;
use super::parsing;
use super::position::Position;

/// Marker appended to every input; the grammar requires it after the
/// closing brace.
pub const END_MARKER: &str = "end";

/// Token source for one parse at a time.
#[derive(Debug, Clone, Default)]
pub struct Session {
    buffer: String,
    offset: usize,
    peeked: Option<Token>,
    extras: LexerExtras,
}

impl Session {
    pub fn new(extras: LexerExtras) -> Self {
        Self {
            extras,
            ..Self::default()
        }
    }

    /// Point the session at a new input, followed by the end marker.
    pub fn reset(&mut self, input: &str) {
        self.buffer.clear();
        self.buffer.push_str(input);
        self.buffer.push_str(END_MARKER);
        self.offset = 0;
        self.peeked = None;
    }

    /// Everything the tokenizer sees, end marker included.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, Diagnostic> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => scan_token(&self.buffer, self.offset, self.extras)?,
        };
        let token: &Token = self.peeked.insert(token);
        Ok(token)
    }

    /// Consume and return the next token.
    pub fn bump(&mut self) -> Result<Token, Diagnostic> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => scan_token(&self.buffer, self.offset, self.extras)?,
        };
        self.offset = token.span.end;
        Ok(token)
    }

    /// Line and column of a byte offset in the buffer.
    pub fn position(&self, offset: usize) -> Position {
        Position::locate(&self.buffer, offset)
    }
}

/// Parses subtree specifications, one call at a time.
#[derive(Debug, Default)]
pub struct SubtreeSpecificationParser {
    session: Mutex<Session>,
    config: ParserConfig,
}

impl SubtreeSpecificationParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let extras = LexerExtras {
            max_nesting_depth: config.max_nesting_depth,
        };
        Self {
            session: Mutex::new(Session::new(extras)),
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one specification.
    ///
    /// Blank input yields `Ok(None)` without running the grammar.
    pub fn parse(&self, spec: &str) -> Result<Option<SubtreeSpecification>, ParseError> {
        if spec.trim().is_empty() {
            debug!("blank subtree specification");
            return Ok(None);
        }

        // A panic mid-parse leaves nothing behind that reset does not clear.
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        session.reset(spec);

        match parsing::parse_specification(&mut session, &self.config) {
            Ok(value) => {
                debug!(input = spec, parsed = %value, "parsed subtree specification");
                Ok(Some(value))
            }
            Err(diagnostic) => {
                let err = ParseError::new(spec, diagnostic);
                debug!(input = spec, error = %err.message(), "subtree specification rejected");
                Err(err)
            }
        }
    }
}

/// Parse with a one-off parser and the default configuration.
pub fn parse_subtree_specification(
    spec: &str,
) -> Result<Option<SubtreeSpecification>, ParseError> {
    SubtreeSpecificationParser::new().parse(spec)
}
