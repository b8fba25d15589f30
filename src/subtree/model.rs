//! Subtree specification values and their builder
//!
//! [`SubtreeSpecification`] is immutable: all fields are private and only
//! readable. Values are assembled with [`SubtreeSpecificationModifier`], which
//! validates as it goes and can produce any number of independent values.
//!
//! The builder is deliberately asymmetric about negative distances: a negative
//! minimum is an error, a negative maximum means "no maximum".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::error::ValidationError;
use super::filter::ExprNode;
use super::name::DistinguishedName;

/// Upper depth bound of a specification.
///
/// Serialized as a number, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum MaximumDistance {
    #[default]
    Unbounded,
    Bounded(u32),
}

impl MaximumDistance {
    /// Any negative input is treated as unbounded.
    pub fn from_signed(distance: i64) -> Result<Self, ValidationError> {
        if distance < 0 {
            return Ok(MaximumDistance::Unbounded);
        }
        u32::try_from(distance)
            .map(MaximumDistance::Bounded)
            .map_err(|_| ValidationError::DistanceOutOfRange(distance))
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, MaximumDistance::Unbounded)
    }

    pub fn as_option(&self) -> Option<u32> {
        match self {
            MaximumDistance::Unbounded => None,
            MaximumDistance::Bounded(d) => Some(*d),
        }
    }
}

impl From<Option<u32>> for MaximumDistance {
    fn from(distance: Option<u32>) -> Self {
        distance.map_or(MaximumDistance::Unbounded, MaximumDistance::Bounded)
    }
}

impl From<MaximumDistance> for Option<u32> {
    fn from(distance: MaximumDistance) -> Self {
        distance.as_option()
    }
}

/// A parsed RFC 3672 subtree specification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubtreeSpecification {
    base: DistinguishedName,
    min_base_distance: u32,
    max_base_distance: MaximumDistance,
    chop_before: BTreeSet<DistinguishedName>,
    chop_after: BTreeSet<DistinguishedName>,
    refinement: Option<ExprNode>,
}

impl SubtreeSpecification {
    /// Start a builder with all defaults.
    pub fn builder() -> SubtreeSpecificationModifier {
        SubtreeSpecificationModifier::new()
    }

    pub fn base(&self) -> &DistinguishedName {
        &self.base
    }

    pub fn min_base_distance(&self) -> u32 {
        self.min_base_distance
    }

    pub fn max_base_distance(&self) -> MaximumDistance {
        self.max_base_distance
    }

    pub fn chop_before_exclusions(&self) -> &BTreeSet<DistinguishedName> {
        &self.chop_before
    }

    pub fn chop_after_exclusions(&self) -> &BTreeSet<DistinguishedName> {
        &self.chop_after
    }

    pub fn refinement(&self) -> Option<&ExprNode> {
        self.refinement.as_ref()
    }

    pub fn has_refinement(&self) -> bool {
        self.refinement.is_some()
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_base_distance.is_unbounded()
    }

    /// Every field still has its default: the whole subtree of the
    /// administrative point.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Canonical text form.
    ///
    /// Only non-default components are written, in a fixed order; parsing the
    /// result yields an equal value.
    pub fn to_text(&self) -> String {
        let mut components = Vec::new();

        if !self.base.is_empty() {
            components.push(format!("base \"{}\"", self.base));
        }

        if !self.chop_before.is_empty() || !self.chop_after.is_empty() {
            let exclusions: Vec<String> = self
                .chop_before
                .iter()
                .map(|name| format!("chopBefore:\"{}\"", name))
                .chain(
                    self.chop_after
                        .iter()
                        .map(|name| format!("chopAfter:\"{}\"", name)),
                )
                .collect();
            components.push(format!("specificExclusions {{ {} }}", exclusions.join(", ")));
        }

        if self.min_base_distance > 0 {
            components.push(format!("minimum {}", self.min_base_distance));
        }

        if let MaximumDistance::Bounded(max) = self.max_base_distance {
            components.push(format!("maximum {}", max));
        }

        if let Some(refinement) = &self.refinement {
            components.push(format!(
                "specificationFilter {}",
                refinement.to_specification_filter()
            ));
        }

        if components.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", components.join(", "))
        }
    }
}

impl fmt::Display for SubtreeSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Mutable staging area for a [`SubtreeSpecification`].
#[derive(Debug, Clone, Default)]
pub struct SubtreeSpecificationModifier {
    base: DistinguishedName,
    min_base_distance: u32,
    max_base_distance: MaximumDistance,
    chop_before: BTreeSet<DistinguishedName>,
    chop_after: BTreeSet<DistinguishedName>,
    refinement: Option<ExprNode>,
}

impl SubtreeSpecificationModifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base(&mut self, base: DistinguishedName) -> &mut Self {
        self.base = base;
        self
    }

    /// Fails on negative input.
    pub fn set_min_base_distance(&mut self, distance: i64) -> Result<&mut Self, ValidationError> {
        if distance < 0 {
            return Err(ValidationError::NegativeMinimum(distance));
        }
        self.min_base_distance =
            u32::try_from(distance).map_err(|_| ValidationError::DistanceOutOfRange(distance))?;
        Ok(self)
    }

    /// Negative input silently means unbounded.
    pub fn set_max_base_distance(&mut self, distance: i64) -> Result<&mut Self, ValidationError> {
        self.max_base_distance = MaximumDistance::from_signed(distance)?;
        Ok(self)
    }

    pub fn set_chop_before_exclusions(
        &mut self,
        exclusions: BTreeSet<DistinguishedName>,
    ) -> &mut Self {
        self.chop_before = exclusions;
        self
    }

    pub fn set_chop_after_exclusions(
        &mut self,
        exclusions: BTreeSet<DistinguishedName>,
    ) -> &mut Self {
        self.chop_after = exclusions;
        self
    }

    pub fn add_chop_before(&mut self, name: DistinguishedName) -> &mut Self {
        self.chop_before.insert(name);
        self
    }

    pub fn add_chop_after(&mut self, name: DistinguishedName) -> &mut Self {
        self.chop_after.insert(name);
        self
    }

    pub fn set_refinement(&mut self, refinement: Option<ExprNode>) -> &mut Self {
        self.refinement = refinement;
        self
    }

    /// Snapshot the current fields into an immutable value.
    pub fn build(&self) -> SubtreeSpecification {
        SubtreeSpecification {
            base: self.base.clone(),
            min_base_distance: self.min_base_distance,
            max_base_distance: self.max_base_distance,
            chop_before: self.chop_before.clone(),
            chop_after: self.chop_after.clone(),
            refinement: self.refinement.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dn(text: &str) -> DistinguishedName {
        DistinguishedName::parse(text).unwrap()
    }

    #[test]
    fn test_defaults() {
        let spec = SubtreeSpecification::builder().build();
        assert!(spec.base().is_empty());
        assert_eq!(spec.min_base_distance(), 0);
        assert_eq!(spec.max_base_distance(), MaximumDistance::Unbounded);
        assert!(spec.chop_before_exclusions().is_empty());
        assert!(spec.chop_after_exclusions().is_empty());
        assert!(spec.refinement().is_none());
        assert!(spec.is_default());
        assert_eq!(spec.to_text(), "{ }");
    }

    #[test]
    fn test_negative_minimum_is_rejected() {
        let mut builder = SubtreeSpecification::builder();
        assert_eq!(
            builder.set_min_base_distance(-1).unwrap_err(),
            ValidationError::NegativeMinimum(-1)
        );
    }

    #[rstest]
    #[case(-1, MaximumDistance::Unbounded)]
    #[case(-42, MaximumDistance::Unbounded)]
    #[case(0, MaximumDistance::Bounded(0))]
    #[case(7, MaximumDistance::Bounded(7))]
    fn test_maximum_normalization(#[case] input: i64, #[case] expected: MaximumDistance) {
        let mut builder = SubtreeSpecification::builder();
        builder.set_max_base_distance(input).unwrap();
        assert_eq!(builder.build().max_base_distance(), expected);
    }

    #[test]
    fn test_distance_out_of_range() {
        let mut builder = SubtreeSpecification::builder();
        assert!(matches!(
            builder.set_min_base_distance(i64::from(u32::MAX) + 1),
            Err(ValidationError::DistanceOutOfRange(_))
        ));
        assert!(matches!(
            builder.set_max_base_distance(i64::MAX),
            Err(ValidationError::DistanceOutOfRange(_))
        ));
    }

    #[test]
    fn test_builds_are_independent() {
        let mut builder = SubtreeSpecification::builder();
        builder.set_base(dn("ou=a"));
        let first = builder.build();
        builder.set_base(dn("ou=b")).add_chop_after(dn("ou=c"));
        let second = builder.build();

        assert_eq!(first.base(), &dn("ou=a"));
        assert!(first.chop_after_exclusions().is_empty());
        assert_eq!(second.base(), &dn("ou=b"));
        assert_eq!(second.chop_after_exclusions().len(), 1);
    }

    #[test]
    fn test_exclusion_sets_are_unique() {
        let mut builder = SubtreeSpecification::builder();
        builder
            .add_chop_before(dn("ou=x"))
            .add_chop_before(dn("OU=x"))
            .add_chop_before(dn("ou=y"));
        assert_eq!(builder.build().chop_before_exclusions().len(), 2);
    }

    #[test]
    fn test_to_text_full() {
        let mut builder = SubtreeSpecification::builder();
        builder
            .set_base(dn("ou=Eng"))
            .add_chop_before(dn("ou=X"))
            .add_chop_after(dn("ou=Y"))
            .set_refinement(Some(ExprNode::and(vec![
                ExprNode::item("a"),
                ExprNode::item("b"),
            ])));
        builder.set_min_base_distance(1).unwrap();
        builder.set_max_base_distance(3).unwrap();

        assert_eq!(
            builder.build().to_text(),
            "{ base \"ou=Eng\", specificExclusions { chopBefore:\"ou=X\", chopAfter:\"ou=Y\" }, \
             minimum 1, maximum 3, specificationFilter and:{ item:a, item:b } }"
        );
    }

    #[test]
    fn test_to_text_filter_fallback() {
        let mut builder = SubtreeSpecification::builder();
        builder.set_refinement(Some(ExprNode::equality("ou", "Legal")));
        assert_eq!(builder.build().to_string(), "{ specificationFilter (ou=Legal) }");
    }

    #[test]
    fn test_maximum_zero_is_written() {
        let mut builder = SubtreeSpecification::builder();
        builder.set_max_base_distance(0).unwrap();
        assert_eq!(builder.build().to_text(), "{ maximum 0 }");
    }
}
