//! Parse boundary cases for [`SemanticVersion`], and the property-based
//! invariants the requirement lattice must satisfy.

use depgraph::{Requirement, SemanticVersion, Strictness};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case::missing_minor_patch("0")]
#[case::missing_patch("1.0")]
#[case::negative_major("-1.0.0")]
#[case::leading_zero_major("01.0.0")]
#[case::trailing_garbage("1.0.0a1")]
#[case::leading_zero_prerelease_identifier("1.0.0-alpha.01")]
#[case::invalid_prerelease_character("1.0.0-alpha$1")]
#[case::invalid_build_metadata_character("1.0.0+build$1")]
fn rejects_malformed_versions(#[case] input: &str) {
    assert!(SemanticVersion::parse(input).is_err(), "expected {input} to fail parsing");
}

#[rstest]
#[case::all_zero("0.0.0")]
#[case::simple("1.0.2")]
#[case::large_numbers("12.345.6789")]
#[case::prerelease("1.0.2-alpha.1")]
#[case::build_metadata("1.0.2+dailybuild")]
#[case::prerelease_and_build_metadata("1.0.2-alpha.1+dailybuild")]
fn accepts_well_formed_versions(#[case] input: &str) {
    assert!(SemanticVersion::parse(input).is_ok(), "expected {input} to parse");
}

fn arb_version() -> impl Strategy<Value = SemanticVersion> {
    (0u64..5, 0u64..5, 0u64..5, proptest::option::of(0u64..3)).prop_map(
        |(major, minor, patch, prerelease)| {
            let pre = prerelease.map(|n| n.to_string());
            SemanticVersion::new(major, minor, patch, pre.as_deref(), None).unwrap()
        },
    )
}

fn arb_requirement() -> impl Strategy<Value = Requirement> {
    arb_version().prop_flat_map(|v| {
        prop_oneof![
            Just(Requirement::Any),
            Just(Requirement::AtLeast(v.clone())),
            Just(Requirement::CompatibleWith(v.clone(), Strictness::Strict)),
            Just(Requirement::Exactly(v)),
        ]
    })
}

proptest! {
    #[test]
    fn intersect_is_commutative(a in arb_requirement(), b in arb_requirement()) {
        prop_assert_eq!(a.intersect(&b), b.intersect(&a));
    }

    #[test]
    fn intersect_is_associative(a in arb_requirement(), b in arb_requirement(), c in arb_requirement()) {
        let left = a.intersect(&b).and_then(|ab| ab.intersect(&c));
        let right = b.intersect(&c).and_then(|bc| a.intersect(&bc));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn intersect_with_any_is_identity(r in arb_requirement()) {
        prop_assert_eq!(Requirement::Any.intersect(&r), Some(r));
    }

    #[test]
    fn intersect_with_exactly_is_exactly_or_none(r in arb_requirement(), v in arb_version()) {
        let exact = Requirement::Exactly(v.clone());
        let result = r.intersect(&exact);
        prop_assert!(matches!(result, None | Some(Requirement::Exactly(_))));
        if r.satisfied_by(&v) {
            prop_assert_eq!(result, Some(Requirement::Exactly(v)));
        }
    }

    #[test]
    fn parse_round_trips_through_display(
        major in 0u64..1000,
        minor in 0u64..1000,
        patch in 0u64..1000,
    ) {
        let version = SemanticVersion::new(major, minor, patch, None, None).unwrap();
        let rendered = version.to_string();
        let reparsed = SemanticVersion::parse(&rendered).unwrap();
        prop_assert_eq!(version, reparsed);
    }

    #[test]
    fn precedence_is_a_total_order(a in arb_version(), b in arb_version()) {
        use std::cmp::Ordering;
        let forward = a.cmp(&b);
        let backward = b.cmp(&a);
        match forward {
            Ordering::Less => prop_assert_eq!(backward, Ordering::Greater),
            Ordering::Greater => prop_assert_eq!(backward, Ordering::Less),
            Ordering::Equal => prop_assert_eq!(backward, Ordering::Equal),
        }
    }
}
