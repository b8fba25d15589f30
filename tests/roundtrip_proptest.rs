//! Property-based tests for subtree specifications
//!
//! Random values are built through the public builder, printed in canonical
//! form and parsed back. The tokenizer and parser are also fed arbitrary text
//! to make sure they fail cleanly instead of panicking.

use proptest::prelude::*;
use subtree_spec::subtree::lexing::tokenize;
use subtree_spec::subtree::{
    DistinguishedName, ExprNode, SubtreeSpecification, SubtreeSpecificationParser,
};

fn name_strategy() -> impl Strategy<Value = DistinguishedName> {
    prop_oneof![
        4 => structured_name_strategy(),
        1 => "[A-Za-z][A-Za-z0-9 ]{0,6}[A-Za-z0-9]".prop_map(|text| {
            DistinguishedName::parse(&text).expect("bare name is valid")
        }),
    ]
}

fn structured_name_strategy() -> impl Strategy<Value = DistinguishedName> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["ou", "cn", "o", "dc", "2.5.4.11"]),
            "[A-Za-z0-9][A-Za-z0-9 ]{0,6}[A-Za-z0-9]",
        ),
        1..4,
    )
    .prop_map(|rdns| {
        let text = rdns
            .iter()
            .map(|(attribute, value)| format!("{}={}", attribute, value))
            .collect::<Vec<_>>()
            .join(",");
        DistinguishedName::parse(&text).expect("generated name is valid")
    })
}

/// Object class names that can never collide with a keyword.
fn object_class_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "oc[A-Za-z0-9]{0,6}",
        (0u32..20, 0u32..20).prop_map(|(a, b)| format!("2.5.{}.{}", a, b)),
    ]
}

fn refinement_strategy() -> impl Strategy<Value = ExprNode> {
    let leaf = object_class_strategy().prop_map(ExprNode::item);
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ExprNode::and),
            prop::collection::vec(inner.clone(), 0..4).prop_map(ExprNode::or),
            inner.prop_map(ExprNode::not),
        ]
    })
}

/// Object classes spelled like reserved words; these only print as filters.
fn keyword_object_class_strategy() -> impl Strategy<Value = ExprNode> {
    prop::sample::select(vec!["base", "end", "item", "and", "or", "not", "minimum"])
        .prop_map(ExprNode::item)
}

/// Assertion values, including characters that must be escaped to print.
fn filter_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 =*()\"\\\\\n\t\u{7f}\u{a0}\u{e9}\u{d7}\u{2603}\u{1F600}]{1,8}"
}

fn filter_strategy() -> impl Strategy<Value = ExprNode> {
    let leaf = prop_oneof![
        object_class_strategy().prop_map(ExprNode::item),
        keyword_object_class_strategy(),
        ("[a-z]{1,6}", filter_value_strategy())
            .prop_map(|(attribute, value)| ExprNode::equality(attribute, value)),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(ExprNode::and),
            prop::collection::vec(inner.clone(), 1..4).prop_map(ExprNode::or),
            inner.prop_map(ExprNode::not),
        ]
    })
}

fn specification_strategy() -> impl Strategy<Value = SubtreeSpecification> {
    (
        prop::option::of(name_strategy()),
        prop::collection::btree_set(name_strategy(), 0..3),
        prop::collection::btree_set(name_strategy(), 0..3),
        0i64..50,
        -5i64..50,
        prop::option::of(prop_oneof![refinement_strategy(), filter_strategy()]),
    )
        .prop_map(|(base, chop_before, chop_after, min, max, refinement)| {
            let mut builder = SubtreeSpecification::builder();
            builder
                .set_chop_before_exclusions(chop_before)
                .set_chop_after_exclusions(chop_after)
                .set_refinement(refinement);
            if let Some(base) = base {
                builder.set_base(base);
            }
            builder.set_min_base_distance(min).expect("non-negative");
            builder.set_max_base_distance(max).expect("in range");
            builder.build()
        })
}

proptest! {
    #[test]
    fn canonical_text_round_trips(spec in specification_strategy()) {
        let text = spec.to_text();
        let parsed = SubtreeSpecificationParser::new()
            .parse(&text)
            .unwrap_or_else(|e| panic!("{} failed: {}", text, e));
        prop_assert_eq!(parsed, Some(spec));
    }

    #[test]
    fn reused_parser_matches_fresh_parser(
        first in specification_strategy(),
        second in specification_strategy(),
    ) {
        let parser = SubtreeSpecificationParser::new();
        parser.parse(&first.to_text()).unwrap();
        let reused = parser.parse(&second.to_text()).unwrap();
        let fresh = SubtreeSpecificationParser::new().parse(&second.to_text()).unwrap();
        prop_assert_eq!(reused, fresh);
    }

    #[test]
    fn tokenizer_never_panics(input in "\\PC{0,64}") {
        let _ = tokenize(&input);
    }

    #[test]
    fn parser_never_panics(input in "[{} a-zA-Z0-9,:\"()&|!=.\\-]{0,64}") {
        let _ = SubtreeSpecificationParser::new().parse(&input);
    }

    #[test]
    fn refinements_print_in_refinement_form(node in refinement_strategy()) {
        prop_assert!(node.is_refinement());
        let text = node.to_specification_filter();
        prop_assert!(!text.starts_with('('));
    }
}
