//! Character classes used by the tokenizer
//!
//! Each class is a sorted list of inclusive code point ranges. Membership is a
//! binary search over the table, so extending a class is a one-line change.

use std::cmp::Ordering;

/// Inclusive range of characters.
pub type CharRange = (char, char);

/// Characters allowed between the quotes of a string.
///
/// Printable ASCII without the quote, plus the Latin-1 letters (without the
/// multiplication and division signs) and the BMP blocks used for names:
/// Latin extended through Greek extended, kana and CJK compatibility, CJK
/// extension A and the unified / compatibility ideographs.
pub const SAFE_UTF8: &[CharRange] = &[
    ('\u{0020}', '\u{0021}'),
    ('\u{0023}', '\u{007E}'),
    ('\u{00C0}', '\u{00D6}'),
    ('\u{00D8}', '\u{00F6}'),
    ('\u{00F8}', '\u{00FF}'),
    ('\u{0100}', '\u{1FFF}'),
    ('\u{3040}', '\u{318F}'),
    ('\u{3300}', '\u{337F}'),
    ('\u{3400}', '\u{3D2D}'),
    ('\u{4E00}', '\u{9FFF}'),
    ('\u{F900}', '\u{FAFF}'),
];

/// Characters that open a filter block as an operator instead of an assertion.
pub const FILTER_METACHARACTERS: &[char] = &['!', '&', '(', ')', '|'];

fn in_table(table: &[CharRange], ch: char) -> bool {
    table
        .binary_search_by(|&(lo, hi)| {
            if hi < ch {
                Ordering::Less
            } else if lo > ch {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

pub fn is_safe_utf8(ch: char) -> bool {
    in_table(SAFE_UTF8, ch)
}

/// First character of an assertion body inside `( ... )`.
pub fn is_filter_value_start(ch: char) -> bool {
    is_safe_utf8(ch) && !FILTER_METACHARACTERS.contains(&ch)
}

/// Any later character of an assertion body; only `)` ends it.
pub fn is_filter_value_char(ch: char) -> bool {
    is_safe_utf8(ch) && ch != ')'
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}
