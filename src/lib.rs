//! # subtree-spec
//!
//! A parser for RFC 3672 subtree specifications, the LDAP syntax that selects
//! the entries of an administrative area:
//!
//! ```text
//! { base "ou=Engineering", specificExclusions { chopAfter:"ou=Archive" },
//!   minimum 1, maximum 3, specificationFilter and:{ item:person, not:{ item:alias } } }
//! ```
//!
//! See [`subtree::SubtreeSpecificationParser`] to parse and
//! [`subtree::SubtreeSpecification`] for the result.

pub mod subtree;
