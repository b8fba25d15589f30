//! Source positions for diagnostics
//!
//! The tokenizer works on byte offsets. Errors are reported to callers as
//! `line:column` pairs, both 1-based, with columns counted in characters so that
//! non-ASCII names inside quoted strings do not skew the reported column.

use serde::Serialize;
use std::fmt;

/// A location in the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Resolve a byte offset against `source`.
    ///
    /// Offsets past the end of the source are clamped to the end, and offsets
    /// that fall inside a multi-byte character are moved back to its start.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = source[line_start..offset].chars().count() + 1;

        Self::new(offset, line, column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}
