//! Subtree specification grammar
//!
//! Recursive descent over the tokens of a [`Session`]. Each rule consumes
//! exactly the tokens it names, spaces included:
//!
//! ```text
//! specification  = SP* "{" SP* [ component SP* *( "," SP* component SP* ) ] "}" SP* "end"
//! component      = "base" SP+ string
//!                / "specificExclusions" SP+ exclusions
//!                / "minimum" SP+ integer
//!                / "maximum" SP+ integer
//!                / "specificationFilter" SP+ ( filter / refinement )
//! exclusions     = "{" SP* [ exclusion SP* *( "," SP* exclusion SP* ) ] "}"
//! exclusion      = ( "chopBefore" / "chopAfter" ) SP* ":" SP* string
//! refinement     = "item" SP* ":" SP* oid
//!                / ( "and" / "or" / "not" ) SP* ":" SP* refinements
//! refinements    = "{" SP* [ refinement SP* *( "," SP* refinement SP* ) ] "}"
//! ```
//!
//! Values go straight into a [`SubtreeSpecificationModifier`]; its validation
//! errors are reported at the token that carried the value.

use std::collections::BTreeSet;
use tracing::trace;

use super::config::{DuplicatePolicy, ParserConfig};
use super::error::{Diagnostic, ErrorKind, SyntaxError, ValidationError};
use super::filter::{parse_filter_with_limit, ExprNode};
use super::lexing::{Keyword, Token, TokenKind};
use super::model::{SubtreeSpecification, SubtreeSpecificationModifier};
use super::name::DistinguishedName;
use super::session::Session;

/// Run the grammar over a session that has already been reset.
pub fn parse_specification(
    session: &mut Session,
    config: &ParserConfig,
) -> Result<SubtreeSpecification, Diagnostic> {
    let mut parser = Parser {
        session,
        config,
        builder: SubtreeSpecificationModifier::new(),
        seen: Vec::new(),
    };
    parser.specification()?;
    Ok(parser.builder.build())
}

struct Parser<'a> {
    session: &'a mut Session,
    config: &'a ParserConfig,
    builder: SubtreeSpecificationModifier,
    seen: Vec<Keyword>,
}

impl Parser<'_> {
    fn peek_kind(&mut self) -> Result<TokenKind, Diagnostic> {
        Ok(self.session.peek()?.kind)
    }

    fn error_at(&self, token: &Token, kind: impl Into<ErrorKind>) -> Diagnostic {
        Diagnostic::new(kind, self.session.position(token.span.start))
    }

    fn unexpected(&mut self, expected: &str) -> Diagnostic {
        match self.session.bump() {
            Ok(token) => self.error_at(
                &token,
                SyntaxError::UnexpectedToken {
                    expected: expected.to_string(),
                    found: token.describe(),
                },
            ),
            Err(err) => err,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.peek_kind()? == kind {
            self.session.bump()
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    /// SP*
    fn skip_spaces(&mut self) -> Result<(), Diagnostic> {
        while self.peek_kind()?.is_space() {
            self.session.bump()?;
        }
        Ok(())
    }

    /// SP+
    fn require_spaces(&mut self) -> Result<(), Diagnostic> {
        self.expect(TokenKind::Space)?;
        self.skip_spaces()
    }

    /// `"{" SP* [ item SP* *( "," SP* item SP* ) ] "}"`
    fn braced_list<F>(&mut self, mut item: F) -> Result<(), Diagnostic>
    where
        F: FnMut(&mut Self) -> Result<(), Diagnostic>,
    {
        self.expect(TokenKind::OpenCurly)?;
        self.skip_spaces()?;
        if self.peek_kind()? != TokenKind::CloseCurly {
            loop {
                item(self)?;
                self.skip_spaces()?;
                if self.peek_kind()? != TokenKind::Sep {
                    break;
                }
                self.session.bump()?;
                self.skip_spaces()?;
            }
        }
        self.expect(TokenKind::CloseCurly)?;
        Ok(())
    }

    fn specification(&mut self) -> Result<(), Diagnostic> {
        self.skip_spaces()?;
        self.braced_list(Self::component)?;
        self.skip_spaces()?;
        self.expect(TokenKind::Keyword(Keyword::End))?;

        let token = self.session.bump()?;
        if token.kind != TokenKind::Eof {
            let rest = self.session.buffer()[token.span.start..].to_string();
            return Err(self.error_at(&token, SyntaxError::TrailingInput(rest)));
        }
        Ok(())
    }

    fn component(&mut self) -> Result<(), Diagnostic> {
        let keyword = match self.peek_kind()? {
            TokenKind::Keyword(
                keyword @ (Keyword::Base
                | Keyword::SpecificExclusions
                | Keyword::Minimum
                | Keyword::Maximum
                | Keyword::SpecificationFilter),
            ) => keyword,
            _ => return Err(self.unexpected("component keyword")),
        };
        let token = self.session.bump()?;

        if self.seen.contains(&keyword) {
            if self.config.duplicate_components == DuplicatePolicy::Reject {
                return Err(self.error_at(&token, SyntaxError::DuplicateComponent(keyword.as_str())));
            }
            trace!(component = keyword.as_str(), "replacing earlier component");
        } else {
            self.seen.push(keyword);
        }

        self.require_spaces()?;
        match keyword {
            Keyword::Base => {
                let base = self.distinguished_name()?;
                self.builder.set_base(base);
            }
            Keyword::SpecificExclusions => self.specific_exclusions()?,
            Keyword::Minimum => {
                let (token, distance) = self.base_distance()?;
                let outcome = self.builder.set_min_base_distance(distance).map(|_| ());
                outcome.map_err(|err| self.error_at(&token, err))?;
            }
            Keyword::Maximum => {
                let (token, distance) = self.base_distance()?;
                let outcome = self.builder.set_max_base_distance(distance).map(|_| ());
                outcome.map_err(|err| self.error_at(&token, err))?;
            }
            _ => {
                let refinement = self.specification_filter()?;
                self.builder.set_refinement(Some(refinement));
            }
        }
        trace!(component = keyword.as_str(), "parsed component");
        Ok(())
    }

    fn specific_exclusions(&mut self) -> Result<(), Diagnostic> {
        let mut chop_before = BTreeSet::new();
        let mut chop_after = BTreeSet::new();

        self.braced_list(|parser| {
            let target = match parser.peek_kind()? {
                TokenKind::Keyword(Keyword::ChopBefore) => &mut chop_before,
                TokenKind::Keyword(Keyword::ChopAfter) => &mut chop_after,
                _ => return Err(parser.unexpected("'chopBefore' or 'chopAfter'")),
            };
            parser.session.bump()?;
            parser.colon()?;
            target.insert(parser.distinguished_name()?);
            Ok(())
        })?;

        self.builder
            .set_chop_before_exclusions(chop_before)
            .set_chop_after_exclusions(chop_after);
        Ok(())
    }

    /// `SP* ":" SP*`
    fn colon(&mut self) -> Result<(), Diagnostic> {
        self.skip_spaces()?;
        self.expect(TokenKind::Colon)?;
        self.skip_spaces()
    }

    fn distinguished_name(&mut self) -> Result<DistinguishedName, Diagnostic> {
        let token = self.expect(TokenKind::SafeUtf8String)?;
        DistinguishedName::parse(&token.text).map_err(|err| self.error_at(&token, err))
    }

    /// Negative literals too wide for `i64` saturate and are left to the
    /// builder; positive ones fail here.
    fn base_distance(&mut self) -> Result<(Token, i64), Diagnostic> {
        let token = self.expect(TokenKind::Integer)?;
        let distance = match token.text.parse::<i64>() {
            Ok(distance) => distance,
            Err(_) if token.text.starts_with('-') => i64::MIN,
            Err(_) => {
                return Err(
                    self.error_at(&token, ValidationError::DistanceOutOfRange(i64::MAX))
                )
            }
        };
        Ok((token, distance))
    }

    fn specification_filter(&mut self) -> Result<ExprNode, Diagnostic> {
        if self.peek_kind()? != TokenKind::Filter {
            return self.refinement(1);
        }

        let token = self.session.bump()?;
        parse_filter_with_limit(&token.text, self.config.max_nesting_depth).map_err(|err| {
            let offset = token.span.start + err.position.offset;
            Diagnostic::new(err.kind, self.session.position(offset))
        })
    }

    fn refinement(&mut self, depth: usize) -> Result<ExprNode, Diagnostic> {
        let keyword = match self.peek_kind()? {
            TokenKind::Keyword(
                keyword @ (Keyword::Item | Keyword::And | Keyword::Or | Keyword::Not),
            ) => keyword,
            _ => return Err(self.unexpected("refinement or filter")),
        };
        let token = self.session.bump()?;
        if depth > self.config.max_nesting_depth {
            return Err(self.error_at(
                &token,
                SyntaxError::NestingTooDeep(self.config.max_nesting_depth),
            ));
        }
        self.colon()?;

        if keyword == Keyword::Item {
            return Ok(ExprNode::item(self.oid()?));
        }

        let mut children = Vec::new();
        self.braced_list(|parser| {
            children.push(parser.refinement(depth + 1)?);
            Ok(())
        })?;

        match keyword {
            Keyword::And => Ok(ExprNode::and(children)),
            Keyword::Or => Ok(ExprNode::or(children)),
            _ => match children.pop() {
                Some(child) if children.is_empty() => Ok(ExprNode::not(child)),
                other => {
                    let found = children.len() + usize::from(other.is_some());
                    Err(self.error_at(&token, SyntaxError::NotArity(found)))
                }
            },
        }
    }

    fn oid(&mut self) -> Result<String, Diagnostic> {
        match self.peek_kind()? {
            TokenKind::Descr | TokenKind::NumericOid => Ok(self.session.bump()?.text),
            _ => Err(self.unexpected("object class descriptor or numeric OID")),
        }
    }
}
