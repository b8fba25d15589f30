//! Expression tree for specification filters
//!
//! A refinement is the restricted form RFC 3672 defines (`item:`, `and:`,
//! `or:`, `not:` over object classes), but the tree itself accepts any
//! combination of equality assertions. Nodes are kept exactly as written: no
//! flattening, deduplication or reordering.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::subtree::lexing::char_classes::is_filter_value_char;
use crate::subtree::lexing::Keyword;

/// Attribute a refinement `item:` tests.
pub const OBJECT_CLASS_AT: &str = "objectClass";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExprNode {
    Equality { attribute: String, value: String },
    And { children: Vec<ExprNode> },
    Or { children: Vec<ExprNode> },
    Not { child: Box<ExprNode> },
}

impl ExprNode {
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        ExprNode::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// `item:<oid>`, i.e. `objectClass=<oid>`.
    pub fn item(object_class: impl Into<String>) -> Self {
        Self::equality(OBJECT_CLASS_AT, object_class)
    }

    pub fn and(children: Vec<ExprNode>) -> Self {
        ExprNode::And { children }
    }

    pub fn or(children: Vec<ExprNode>) -> Self {
        ExprNode::Or { children }
    }

    pub fn not(child: ExprNode) -> Self {
        ExprNode::Not {
            child: Box::new(child),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ExprNode::Equality { .. })
    }

    pub fn children(&self) -> &[ExprNode] {
        match self {
            ExprNode::Equality { .. } => &[],
            ExprNode::And { children } | ExprNode::Or { children } => children,
            ExprNode::Not { child } => std::slice::from_ref(child),
        }
    }

    /// Depth of the tree; a single assertion has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(ExprNode::depth).max().unwrap_or(0)
    }

    /// True when the tree can be written in refinement syntax.
    pub fn is_refinement(&self) -> bool {
        match self {
            ExprNode::Equality { attribute, value } => {
                attribute == OBJECT_CLASS_AT && is_oid(value)
            }
            ExprNode::And { children } | ExprNode::Or { children } => {
                children.iter().all(ExprNode::is_refinement)
            }
            ExprNode::Not { child } => child.is_refinement(),
        }
    }

    /// Refinement syntax, e.g. `and:{ item:person, not:{ item:alias } }`.
    ///
    /// `None` when some node has no refinement spelling.
    pub fn to_refinement_string(&self) -> Option<String> {
        if !self.is_refinement() {
            return None;
        }
        let mut out = String::new();
        write_refinement(self, &mut out);
        Some(out)
    }

    /// RFC 4515 string form, e.g. `(&(objectClass=person)(ou=a))`.
    pub fn to_filter_string(&self) -> String {
        let mut out = String::new();
        write_filter(self, &mut out);
        out
    }

    /// Refinement syntax when possible, filter syntax otherwise.
    pub fn to_specification_filter(&self) -> String {
        self.to_refinement_string()
            .unwrap_or_else(|| self.to_filter_string())
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}

/// Whether `value` reads back as a single descriptor or numeric OID token.
fn is_oid(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
                && Keyword::lookup(value).is_none()
        }
        Some(c) if c.is_ascii_digit() => {
            value.split('.').count() > 1
                && value.split('.').all(|part| {
                    !part.is_empty()
                        && part.chars().all(|c| c.is_ascii_digit())
                        && (part == "0" || !part.starts_with('0'))
                })
        }
        _ => false,
    }
}

fn write_refinement(node: &ExprNode, out: &mut String) {
    let (keyword, children) = match node {
        ExprNode::Equality { value, .. } => {
            out.push_str("item:");
            out.push_str(value);
            return;
        }
        ExprNode::And { children } => ("and", children.as_slice()),
        ExprNode::Or { children } => ("or", children.as_slice()),
        ExprNode::Not { child } => ("not", std::slice::from_ref(child.as_ref())),
    };

    out.push_str(keyword);
    out.push_str(":{");
    for (i, child) in children.iter().enumerate() {
        out.push_str(if i == 0 { " " } else { ", " });
        write_refinement(child, out);
    }
    out.push_str(" }");
}

fn write_filter(node: &ExprNode, out: &mut String) {
    match node {
        ExprNode::Equality { attribute, value } => {
            out.push('(');
            out.push_str(attribute);
            out.push('=');
            escape_value(value, out);
            out.push(')');
        }
        ExprNode::And { children } | ExprNode::Or { children } => {
            out.push('(');
            out.push(if matches!(node, ExprNode::And { .. }) { '&' } else { '|' });
            for child in children {
                write_filter(child, out);
            }
            out.push(')');
        }
        ExprNode::Not { child } => {
            out.push_str("(!");
            write_filter(child, out);
            out.push(')');
        }
    }
}

/// RFC 4515 value escaping.
///
/// Reserved characters and anything the filter scanner would refuse are
/// written as `\XX`, one escape per UTF-8 byte.
fn escape_value(value: &str, out: &mut String) {
    for ch in value.chars() {
        if matches!(ch, '*' | '(' | ')' | '\\') || !is_filter_value_char(ch) {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "\\{:02x}", byte);
            }
        } else {
            out.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExprNode {
        ExprNode::and(vec![
            ExprNode::item("person"),
            ExprNode::not(ExprNode::item("2.5.6.1")),
        ])
    }

    #[test]
    fn test_refinement_string() {
        assert_eq!(
            sample().to_refinement_string().as_deref(),
            Some("and:{ item:person, not:{ item:2.5.6.1 } }")
        );
    }

    #[test]
    fn test_empty_composite_refinement() {
        assert_eq!(
            ExprNode::or(vec![]).to_refinement_string().as_deref(),
            Some("or:{ }")
        );
    }

    #[test]
    fn test_filter_string() {
        assert_eq!(
            sample().to_filter_string(),
            "(&(objectClass=person)(!(objectClass=2.5.6.1)))"
        );
    }

    #[test]
    fn test_non_refinement_falls_back_to_filter() {
        let node = ExprNode::or(vec![
            ExprNode::item("person"),
            ExprNode::equality("ou", "Legal"),
        ]);
        assert!(!node.is_refinement());
        assert_eq!(node.to_specification_filter(), "(|(objectClass=person)(ou=Legal))");
    }

    #[test]
    fn test_attribute_case_matters_for_refinements() {
        assert!(!ExprNode::equality("objectclass", "person").is_refinement());
    }

    #[test]
    fn test_filter_value_escaping() {
        let node = ExprNode::equality("cn", "a*(b)\\");
        assert_eq!(node.to_filter_string(), "(cn=a\\2a\\28b\\29\\5c)");
    }

    #[test]
    fn test_unsafe_value_characters_are_escaped() {
        let node = ExprNode::equality("cn", "a\"b\nc\u{7f}\u{a0}😀");
        assert_eq!(
            node.to_filter_string(),
            "(cn=a\\22b\\0ac\\7f\\c2\\a0\\f0\\9f\\98\\80)"
        );
        assert_eq!(ExprNode::equality("cn", "Jürgen").to_filter_string(), "(cn=Jürgen)");
    }

    #[test]
    fn test_keyword_object_class_is_not_a_refinement() {
        let node = ExprNode::and(vec![ExprNode::item("end"), ExprNode::item("item")]);
        assert!(!node.is_refinement());
        assert_eq!(
            node.to_specification_filter(),
            "(&(objectClass=end)(objectClass=item))"
        );
        assert!(!ExprNode::item("base").is_refinement());
    }

    #[test]
    fn test_depth() {
        assert_eq!(ExprNode::item("a").depth(), 1);
        assert_eq!(sample().depth(), 3);
    }

    #[test]
    fn test_oid_values() {
        assert!(is_oid("person"));
        assert!(is_oid("2.5.6.0"));
        assert!(!is_oid("2"));
        assert!(!is_oid("01.2"));
        assert!(!is_oid("a b"));
        assert!(!is_oid(""));
        assert!(!is_oid("base"));
        assert!(!is_oid("not"));
    }
}
