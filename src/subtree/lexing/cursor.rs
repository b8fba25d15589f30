//! Character cursor with explicit backtracking
//!
//! The context-sensitive scanners (numbers, filter blocks) need more than the
//! one character of lookahead a regex gives them. Instead of throwing and
//! catching, they take a [`Mark`], try an alternative, and [`Cursor::rewind`]
//! to the mark if it does not pan out. Nothing is emitted until the caller
//! commits by reading [`Cursor::offset`].

/// Saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `expected` if it is next.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume while `pred` holds, returning how many characters were taken.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
            count += 1;
        }
        count
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn rewind(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Run `attempt`; keep its progress only if it returns `true`.
    pub fn speculate(&mut self, attempt: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.mark();
        if attempt(self) {
            true
        } else {
            self.rewind(mark);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speculate_commits_on_success() {
        let mut cursor = Cursor::new(".12x");
        assert!(cursor.speculate(|c| c.eat('.') && c.eat_while(|ch| ch.is_ascii_digit()) > 0));
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn test_speculate_rewinds_on_failure() {
        let mut cursor = Cursor::new(".x");
        assert!(!cursor.speculate(|c| c.eat('.') && c.eat_while(|ch| ch.is_ascii_digit()) > 0));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_bump_multibyte() {
        let mut cursor = Cursor::new("ü)");
        assert_eq!(cursor.bump(), Some('ü'));
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.rest(), ")");
        assert!(cursor.eat(')'));
        assert!(cursor.is_at_end());
    }
}
