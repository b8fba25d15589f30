//! Distinguished names relative to an administrative point
//!
//! `base`, `chopBefore` and `chopAfter` all name entries below the
//! administrative point. The names are parsed with the RFC 4514 structure
//! (RDNs separated by `,` or `;`, multi-valued RDNs joined by `+`, each
//! component `type=value`) so malformed names are rejected at parse time, but
//! no schema is consulted: attribute types are compared case-insensitively and
//! values exactly, after unescaping.
//!
//! Text with no unescaped `=`, `,`, `;` or `+` is taken as a bare name: a
//! single component whose attribute type is empty.
//!
//! The text the user wrote is kept for display.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::error::ValidationError;

static ATTRIBUTE_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9\-]*|(?:0|[1-9][0-9]*)(?:\.(?:0|[1-9][0-9]*))+)$")
        .expect("attribute type pattern is valid")
});

/// Characters that may follow a backslash verbatim.
const ESCAPABLE: &[char] = &[' ', '"', '#', '+', ',', ';', '<', '=', '>', '\\'];

/// One `type=value` pair, normalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeTypeAndValue {
    /// Lowercased attribute type; empty for a bare name.
    pub attribute_type: String,
    /// Unescaped value.
    pub value: String,
}

/// A relative distinguished name: one or more pairs, kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rdn {
    pub avas: Vec<AttributeTypeAndValue>,
}

/// A name made of RDNs, leftmost first. The empty name denotes the
/// administrative point itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let raw = text.trim();
        if raw.is_empty() {
            return Ok(Self::empty());
        }

        let invalid = |reason: String| ValidationError::InvalidName {
            name: raw.to_string(),
            reason,
        };

        if split_unescaped(raw, &['=', ',', ';', '+']).len() == 1 {
            let value = unescape(raw).map_err(invalid)?;
            return Ok(Self {
                raw: raw.to_string(),
                rdns: vec![Rdn {
                    avas: vec![AttributeTypeAndValue {
                        attribute_type: String::new(),
                        value,
                    }],
                }],
            });
        }

        let mut rdns = Vec::new();
        for rdn_text in split_unescaped(raw, &[',', ';']) {
            let mut avas = Vec::new();
            for ava_text in split_unescaped(rdn_text, &['+']) {
                avas.push(parse_ava(ava_text).map_err(invalid)?);
            }
            avas.sort();
            rdns.push(Rdn { avas });
        }

        Ok(Self {
            raw: raw.to_string(),
            rdns,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// True for a name written without any `type=value` structure.
    pub fn is_bare(&self) -> bool {
        match self.rdns.as_slice() {
            [rdn] => rdn.avas.len() == 1 && rdn.avas[0].attribute_type.is_empty(),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Number of RDNs.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }
}

/// Split on separators that are not preceded by a backslash escape.
fn split_unescaped<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if separators.contains(&ch) {
            parts.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_ava(text: &str) -> Result<AttributeTypeAndValue, String> {
    let (attribute_type, value) = text
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in {:?}", text.trim()))?;

    let attribute_type = attribute_type.trim();
    if !ATTRIBUTE_TYPE.is_match(attribute_type) {
        return Err(format!("invalid attribute type {:?}", attribute_type));
    }

    Ok(AttributeTypeAndValue {
        attribute_type: attribute_type.to_ascii_lowercase(),
        value: unescape(trim_value(value))?,
    })
}

/// Trim surrounding spaces, keeping a trailing space that is escaped.
fn trim_value(value: &str) -> &str {
    let value = value.trim_start_matches(' ');
    let mut end = value.len();
    while end > 0 && value[..end].ends_with(' ') {
        let backslashes = value[..end - 1]
            .chars()
            .rev()
            .take_while(|&c| c == '\\')
            .count();
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &value[..end]
}

fn unescape(value: &str) -> Result<String, String> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some((_, next)) if ESCAPABLE.contains(&next) => bytes.push(next as u8),
            Some((_, hi)) if hi.is_ascii_hexdigit() => match chars.next() {
                Some((_, lo)) if lo.is_ascii_hexdigit() => {
                    let pair = [hi as u8, lo as u8];
                    let hex = std::str::from_utf8(&pair).map_err(|e| e.to_string())?;
                    let byte = u8::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
                    bytes.push(byte);
                }
                _ => return Err(format!("incomplete hex escape at byte {}", i)),
            },
            _ => return Err(format!("invalid escape at byte {}", i)),
        }
    }
    String::from_utf8(bytes).map_err(|_| "escaped value is not valid UTF-8".to_string())
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for DistinguishedName {}

impl Hash for DistinguishedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rdns.hash(state);
    }
}

impl PartialOrd for DistinguishedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistinguishedName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rdns.cmp(&other.rdns)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DistinguishedName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DistinguishedName> for String {
    fn from(name: DistinguishedName) -> Self {
        name.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dn(text: &str) -> DistinguishedName {
        DistinguishedName::parse(text).unwrap()
    }

    #[test]
    fn test_empty_name() {
        assert!(dn("").is_empty());
        assert!(dn("   ").is_empty());
        assert_eq!(dn(""), DistinguishedName::empty());
    }

    #[test]
    fn test_components() {
        let name = dn("ou=Engineering, o=Acme");
        assert_eq!(name.len(), 2);
        assert_eq!(name.rdns()[0].avas[0].attribute_type, "ou");
        assert_eq!(name.rdns()[0].avas[0].value, "Engineering");
        assert_eq!(name.to_string(), "ou=Engineering, o=Acme");
    }

    #[test]
    fn test_equality_ignores_type_case_and_spacing() {
        assert_eq!(dn("OU=Eng,o=Acme"), dn("ou=Eng , o=Acme"));
        assert_ne!(dn("ou=Eng"), dn("ou=eng"));
    }

    #[test]
    fn test_multi_valued_rdn_is_unordered() {
        assert_eq!(dn("cn=a+sn=b"), dn("sn=b+cn=a"));
        assert_eq!(dn("cn=a+sn=b").rdns()[0].avas.len(), 2);
    }

    #[test]
    fn test_escapes() {
        let name = dn(r"cn=Smith\, John,ou=People");
        assert_eq!(name.len(), 2);
        assert_eq!(name.rdns()[0].avas[0].value, "Smith, John");

        let name = dn(r"cn=caf\C3\A9");
        assert_eq!(name.rdns()[0].avas[0].value, "café");

        let name = dn(r"cn=trailing\ ");
        assert_eq!(name.rdns()[0].avas[0].value, "trailing ");
    }

    #[test]
    fn test_numeric_oid_type() {
        assert_eq!(dn("2.5.4.11=Eng"), dn("2.5.4.11=Eng"));
    }

    #[test]
    fn test_invalid_names() {
        for text in ["=x", "1ou=x", "ou=a,", "ou=a+", "A,B", r"cn=a\", r"cn=\zz", r"A\"] {
            assert!(
                matches!(
                    DistinguishedName::parse(text),
                    Err(ValidationError::InvalidName { .. })
                ),
                "{:?} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_bare_name() {
        let name = dn("A");
        assert!(name.is_bare());
        assert!(!name.is_empty());
        assert_eq!(name.len(), 1);
        assert_eq!(name.rdns()[0].avas[0].value, "A");
        assert_eq!(name.to_string(), "A");
        assert_eq!(dn(" A "), name);
        assert_ne!(dn("a"), name);
        assert_ne!(dn("ou=A"), name);
        assert!(!dn("ou=A").is_bare());
        assert_eq!(dn(r"x\2Cy").rdns()[0].avas[0].value, "x,y");
    }

    #[test]
    fn test_serde_as_string() {
        let name = dn("ou=a");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"ou=a\"");
        let back: DistinguishedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
