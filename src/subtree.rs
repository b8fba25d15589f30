//! Main module for subtree specification parsing
//!
//! The usual entry point is [`SubtreeSpecificationParser`]:
//!
//! ```text
//! let parser = SubtreeSpecificationParser::new();
//! let spec = parser.parse("{ base \"ou=Engineering\", minimum 1 }")?;
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod formats;
pub mod lexing;
pub mod model;
pub mod name;
pub mod parsing;
pub mod position;
pub mod session;

pub use config::{DuplicatePolicy, ParserConfig, SubtreeSpecConfig};
pub use error::{ErrorKind, LexicalErrorKind, ParseError, SyntaxError, ValidationError};
pub use filter::ExprNode;
pub use model::{MaximumDistance, SubtreeSpecification, SubtreeSpecificationModifier};
pub use name::DistinguishedName;
pub use session::{parse_subtree_specification, Session, SubtreeSpecificationParser};
