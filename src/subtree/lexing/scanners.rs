//! logos callbacks for the context-sensitive lexemes
//!
//! Every callback starts right after the characters logos already matched and
//! works on [`Lexer::remainder`] through a [`Cursor`]. Progress is handed back
//! to logos with a single [`Lexer::bump`] once the callback knows how far the
//! lexeme extends. On failure the lexer is bumped up to the offending
//! character so the reported span ends where scanning stopped.

use logos::Lexer;

use super::char_classes::{
    is_digit, is_filter_value_char, is_filter_value_start, is_safe_utf8,
};
use super::cursor::Cursor;
use super::tokens::{NumericForm, RawToken};
use crate::subtree::error::LexicalErrorKind;

/// `"` SAFEUTF8CHAR* `"`; the opening quote is already consumed.
pub(crate) fn quoted_string(lex: &mut Lexer<RawToken>) -> Result<(), LexicalErrorKind> {
    let rest = lex.remainder();
    for (i, ch) in rest.char_indices() {
        if ch == '"' {
            lex.bump(i + 1);
            return Ok(());
        }
        if !is_safe_utf8(ch) {
            lex.bump(i);
            return Err(LexicalErrorKind::IllegalStringCharacter(ch));
        }
    }
    lex.bump(rest.len());
    Err(LexicalErrorKind::UnterminatedString)
}

/// A digit run has matched; decide between INTEGER and NUMERICOID.
///
/// The OID alternative is tried speculatively: `('.' INTEGER)+` must match in
/// full for the token to be extended, otherwise the cursor rewinds and the
/// token stays an integer. A dangling `1.` therefore leaves the dot for the
/// next token, where it is rejected.
pub(crate) fn numeric(lex: &mut Lexer<RawToken>) -> NumericForm {
    if lex.slice().starts_with('-') {
        return NumericForm::Integer;
    }

    let mut cursor = Cursor::new(lex.remainder());
    let mut components = 0;
    while cursor.speculate(dotted_component) {
        components += 1;
    }

    if components == 0 {
        NumericForm::Integer
    } else {
        lex.bump(cursor.offset());
        NumericForm::NumericOid
    }
}

/// `'.' ('0' / LDIGIT DIGIT*)`
fn dotted_component(cursor: &mut Cursor) -> bool {
    if !cursor.eat('.') {
        return false;
    }
    match cursor.bump() {
        Some('0') => true,
        Some(ch) if is_digit(ch) => {
            cursor.eat_while(is_digit);
            true
        }
        _ => false,
    }
}

/// A balanced filter block; the opening `(` is already consumed.
pub(crate) fn filter_block(lex: &mut Lexer<RawToken>) -> Result<(), LexicalErrorKind> {
    let max_depth = lex.extras.max_nesting_depth;
    let mut cursor = Cursor::new(lex.remainder());
    let result = filter_body(&mut cursor, 1, max_depth);
    lex.bump(cursor.offset());
    result
}

/// Scan what follows an opening parenthesis, through the matching `)` and the
/// spaces after it.
fn filter_body(cursor: &mut Cursor, depth: usize, max_depth: usize) -> Result<(), LexicalErrorKind> {
    if depth > max_depth {
        return Err(LexicalErrorKind::FilterTooDeep(max_depth));
    }

    match cursor.peek() {
        Some(op @ ('&' | '|')) => {
            cursor.bump();
            cursor.eat_while(|c| c == ' ');
            if cursor.peek() != Some('(') {
                return Err(LexicalErrorKind::MalformedFilter(format!(
                    "'{}' needs at least one nested filter",
                    op
                )));
            }
            while cursor.eat('(') {
                filter_body(cursor, depth + 1, max_depth)?;
            }
        }
        Some('!') => {
            cursor.bump();
            cursor.eat_while(|c| c == ' ');
            if !cursor.eat('(') {
                return Err(LexicalErrorKind::MalformedFilter(
                    "'!' needs exactly one nested filter".to_string(),
                ));
            }
            filter_body(cursor, depth + 1, max_depth)?;
        }
        Some(ch) if is_filter_value_start(ch) => {
            cursor.bump();
            cursor.eat_while(is_filter_value_char);
        }
        Some(_) => {
            return Err(LexicalErrorKind::MalformedFilter(
                "expected a filter operator or an assertion".to_string(),
            ));
        }
        None => return Err(LexicalErrorKind::UnbalancedFilter),
    }

    if !cursor.eat(')') {
        return Err(LexicalErrorKind::UnbalancedFilter);
    }
    cursor.eat_while(|c| c == ' ');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn first(source: &str) -> (Result<RawToken, LexicalErrorKind>, &str) {
        let mut lexer = RawToken::lexer(source);
        let token = lexer.next().expect("a token");
        (token, lexer.slice())
    }

    #[test]
    fn test_quoted_string() {
        assert_eq!(first("\"ou=a\" x"), (Ok(RawToken::QuotedString), "\"ou=a\""));
    }

    #[test]
    fn test_quoted_string_unterminated() {
        let (token, _) = first("\"ou=a }");
        assert_eq!(token, Err(LexicalErrorKind::UnterminatedString));
    }

    #[test]
    fn test_quoted_string_illegal_character() {
        let (token, slice) = first("\"ou=a\nb\"");
        assert_eq!(token, Err(LexicalErrorKind::IllegalStringCharacter('\n')));
        assert_eq!(slice, "\"ou=a");
    }

    #[test]
    fn test_integer_and_oid() {
        assert_eq!(first("123 "), (Ok(RawToken::Numeric(NumericForm::Integer)), "123"));
        assert_eq!(
            first("1.2.3 "),
            (Ok(RawToken::Numeric(NumericForm::NumericOid)), "1.2.3")
        );
        assert_eq!(first("-1"), (Ok(RawToken::Numeric(NumericForm::Integer)), "-1"));
    }

    #[test]
    fn test_dangling_dot_is_not_swallowed() {
        assert_eq!(first("1."), (Ok(RawToken::Numeric(NumericForm::Integer)), "1"));
        assert_eq!(
            first("1.2.x"),
            (Ok(RawToken::Numeric(NumericForm::NumericOid)), "1.2")
        );
    }

    #[test]
    fn test_filter_block_includes_trailing_spaces() {
        assert_eq!(
            first("(&(a=b) (c=d))  }"),
            (Ok(RawToken::Filter), "(&(a=b) (c=d))  ")
        );
    }

    #[test]
    fn test_filter_block_not() {
        assert_eq!(first("(! (a=b))"), (Ok(RawToken::Filter), "(! (a=b))"));
    }

    #[test]
    fn test_filter_block_missing_paren() {
        let (token, _) = first("(&(objectClass=a) }end");
        assert_eq!(token, Err(LexicalErrorKind::UnbalancedFilter));
    }

    #[test]
    fn test_filter_block_empty_composite() {
        let (token, _) = first("(&)");
        assert!(matches!(token, Err(LexicalErrorKind::MalformedFilter(_))));
    }

    #[test]
    fn test_filter_block_depth_limit() {
        let source = "(!(!(!(a=b))))";
        let mut lexer = RawToken::lexer_with_extras(
            source,
            super::super::tokens::LexerExtras {
                max_nesting_depth: 3,
            },
        );
        assert_eq!(lexer.next(), Some(Err(LexicalErrorKind::FilterTooDeep(3))));
    }
}
