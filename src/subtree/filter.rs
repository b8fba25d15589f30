//! Specification filters
//!
//! A `specificationFilter` is either a refinement (parsed by the subtree
//! grammar itself) or a parenthesized LDAP filter, which the tokenizer hands
//! over as one `Filter` token and [`parse_filter`] turns into an [`ExprNode`].

pub mod ast;
pub mod parser;

pub use ast::{ExprNode, OBJECT_CLASS_AT};
pub use parser::{parse_filter, parse_filter_with_limit};
