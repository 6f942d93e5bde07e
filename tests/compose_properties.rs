//! Property-based tests for row composition

use proptest::prelude::*;
use recast::{NodeValue, ObjectComposer, Row, RowClassifier, Scalar};

/// Column names with no identity, group, list or array markers
fn plain_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,8}"
}

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Null),
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Int),
        "[a-z ']{0,12}".prop_map(Scalar::String),
    ]
}

/// Rows of distinct plain columns
fn plain_row() -> impl Strategy<Value = Row> {
    prop::collection::btree_map(plain_name(), scalar(), 0..8)
        .prop_map(|columns| columns.into_iter().collect())
}

proptest! {
    #[test]
    fn rows_without_identity_never_merge(rows in prop::collection::vec(plain_row(), 0..20)) {
        let nodes = ObjectComposer::default().compose_many(&rows).unwrap();
        prop_assert_eq!(nodes.len(), rows.len());
    }

    #[test]
    fn plain_row_round_trips(row in plain_row()) {
        let node = ObjectComposer::default().compose_one(&row).unwrap();

        prop_assert_eq!(node.len(), row.len());
        for ((name, value), field) in node.iter().zip(row.fields()) {
            prop_assert_eq!(name, field.name.as_str());
            prop_assert_eq!(value, &NodeValue::Scalar(field.value.clone()));
        }
    }

    #[test]
    fn shared_identity_accumulates_lists_and_arrays(
        id in any::<i64>(),
        names in prop::collection::vec("[a-z]{1,8}", 1..15),
    ) {
        let rows: Vec<Row> = names
            .iter()
            .enumerate()
            .map(|(i, moon)| {
                let mut row = Row::default();
                row.push("@Id", id);
                row.push("Name", format!("planet-{}", i));
                row.push("#Moons_Name", moon.as_str());
                row.push("#Tags", i as i64);
                row
            })
            .collect();

        let nodes = ObjectComposer::default().compose_many(&rows).unwrap();
        prop_assert_eq!(nodes.len(), 1);

        let node = &nodes[0];
        prop_assert_eq!(
            node.get("Name").and_then(NodeValue::as_scalar),
            Some(&Scalar::from("planet-0"))
        );

        let moons = node.get("Moons").and_then(NodeValue::as_list).unwrap();
        prop_assert_eq!(moons.len(), names.len());
        for (moon, name) in moons.iter().zip(&names) {
            prop_assert_eq!(
                moon.get("Name").and_then(NodeValue::as_scalar),
                Some(&Scalar::from(name.as_str()))
            );
        }

        let tags = node.get("Tags").and_then(NodeValue::as_array).unwrap();
        prop_assert_eq!(tags.len(), names.len());
    }

    #[test]
    fn classification_is_deterministic(
        columns in prop::collection::vec(("[@#]?[A-Za-z_]{0,6}", scalar()), 0..10)
    ) {
        let row: Row = columns.into_iter().collect();
        let classifier = RowClassifier::default();

        prop_assert_eq!(classifier.classify(row.fields()), classifier.classify(row.fields()));
    }
}

#[test]
fn distinct_identities_keep_first_seen_order() {
    let rows: Vec<Row> = [3i64, 1, 3, 2, 1]
        .iter()
        .map(|&id| Row::from_iter([("@Id", Scalar::from(id)), ("#Seen", Scalar::from(id))]))
        .collect();

    let nodes = ObjectComposer::default().compose_many(&rows).unwrap();
    let arrays: Vec<&[Scalar]> = nodes
        .iter()
        .map(|node| node.get("Seen").and_then(NodeValue::as_array).unwrap())
        .collect();

    assert_eq!(arrays.len(), 3);
    assert_eq!(arrays[0], &[Scalar::Int(3), Scalar::Int(3)][..]);
    assert_eq!(arrays[1], &[Scalar::Int(1), Scalar::Int(1)][..]);
    assert_eq!(arrays[2], &[Scalar::Int(2)][..]);
}
