//! Tests for type compatibility, cast inference and edge proposals.
mod common;
use common::*;
use ptbflow::error::ConnectError;
use ptbflow::prelude::*;
use ptbflow::types::{NumericWidth, PtbType, infer_cast_target, is_type_compatible};
use serde_json::json;

fn concrete_types() -> Vec<PtbType> {
    let mut types = vec![
        PtbType::bool(),
        PtbType::string(),
        PtbType::address(),
        PtbType::number(),
        PtbType::object(),
        PtbType::object_of("0x2::coin::Coin<0x2::sui::SUI>"),
        PtbType::vector(PtbType::u64()),
        PtbType::vector(PtbType::vector(PtbType::numeric(NumericWidth::U8))),
        PtbType::Tuple {
            elems: vec![PtbType::bool(), PtbType::object()],
        },
    ];
    types.extend(NumericWidth::ALL.into_iter().map(PtbType::numeric));
    types
}

#[test]
fn test_compatibility_is_reflexive() {
    for ty in concrete_types() {
        assert!(is_type_compatible(&ty, &ty), "{} should accept itself", ty);
    }
}

#[test]
fn test_wildcards_match_everything_both_ways() {
    for wildcard in [PtbType::Unknown, PtbType::type_param("T0")] {
        for ty in concrete_types() {
            assert!(is_type_compatible(&wildcard, &ty));
            assert!(is_type_compatible(&ty, &wildcard));
        }
    }
}

#[test]
fn test_numbers_widen_but_widths_do_not_mix() {
    for width in NumericWidth::ALL {
        let target = PtbType::numeric(width);
        assert!(is_type_compatible(&PtbType::number(), &target));
        assert_eq!(infer_cast_target(&PtbType::number(), &target), Some(width));
    }
    assert!(!is_type_compatible(
        &PtbType::numeric(NumericWidth::U8),
        &PtbType::u64()
    ));
    assert!(!is_type_compatible(&PtbType::u64(), &PtbType::number()));
    assert_eq!(
        infer_cast_target(
            &PtbType::vector(PtbType::number()),
            &PtbType::vector(PtbType::numeric(NumericWidth::U128))
        ),
        Some(NumericWidth::U128)
    );
}

#[test]
fn test_object_tags_are_advisory() {
    assert!(is_type_compatible(
        &PtbType::object_of("0x2::coin::Coin<0x2::sui::SUI>"),
        &PtbType::object_of("0x2::clock::Clock")
    ));
    assert!(!is_type_compatible(&PtbType::address(), &PtbType::object()));
}

#[test]
fn test_number_to_u64_edge_is_annotated_with_cast() {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("n", "n", PtbType::number(), Some(json!(1))));
    graph.add_node(Node::variable("a", "a", PtbType::address(), Some(json!("0x1"))));
    graph.add_node(Node::command(
        "split",
        ptbflow::registry::Command::SplitCoins { amounts_count: 1 },
    ));

    let edge = graph
        .propose_io("n", "out", "split", "in_amount_0")
        .expect("number should flow into u64");
    assert_eq!(edge.cast.map(|c| c.to), Some(NumericWidth::U64));

    let rejected = graph.connect_io("a", "out", "split", "in_coin");
    assert!(matches!(rejected, Err(ConnectError::TypeMismatch { .. })));
    assert!(graph.edges.is_empty());
}

#[test]
fn test_move_type_strings_round_trip_through_display() {
    let ty = PtbType::parse_move("vector<0x2::object::ID>");
    assert_eq!(ty, PtbType::vector(PtbType::object_of("0x2::object::ID")));
    assert_eq!(ty.to_move_type().as_deref(), Some("vector<0x2::object::ID>"));
    assert_eq!(PtbType::parse_move("0x1::ascii::String"), PtbType::string());
    assert_eq!(PtbType::parse_move("signer"), PtbType::Unknown);
    assert_eq!(PtbType::parse_move(""), PtbType::Unknown);
}
