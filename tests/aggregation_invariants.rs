//! Aggregation Invariant Tests
//!
//! - Aggregate values over a known dataset
//! - Empty-input results
//! - Numeric-only sum, comparable min/max
//! - Grouping with structured keys

use querylayer::aggregation::Aggregator;
use querylayer::query::Aggregation;
use querylayer::{FieldValue, QueryErrorCode, Record};
use serde_json::{json, Value};

fn ages() -> Vec<Value> {
    (1..=10).map(|age| json!({ "age": age })).collect()
}

// =============================================================================
// Aggregate Function Tests
// =============================================================================

#[test]
fn test_aggregates_over_one_to_ten() {
    let data = ages();

    assert_eq!(Aggregator::sum(&data, "age").unwrap(), 55.0);
    assert_eq!(Aggregator::avg(&data, "age").unwrap(), Some(5.5));
    assert_eq!(Aggregator::min(&data, "age"), Some(FieldValue::Number(1.0)));
    assert_eq!(Aggregator::max(&data, "age"), Some(FieldValue::Number(10.0)));
    assert_eq!(Aggregator::count(&data), 10);
    assert_eq!(Aggregator::count_distinct(&data, "age"), 10);
}

#[test]
fn test_aggregates_over_empty_input() {
    let empty: Vec<Value> = Vec::new();

    assert_eq!(Aggregator::avg(&empty, "age").unwrap(), None);
    assert_eq!(Aggregator::sum(&empty, "age").unwrap(), 0.0);
    assert_eq!(Aggregator::count(&empty), 0);
    assert_eq!(Aggregator::min(&empty, "age"), None);
    assert_eq!(Aggregator::max(&empty, "age"), None);
}

#[test]
fn test_sum_rejects_non_numeric_values() {
    let mixed = vec![json!({"field": 1}), json!({"field": "x"}), json!({"field": 3})];

    let err = Aggregator::sum(&mixed, "field").unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::TypeMismatch);
    assert_eq!(
        Aggregator::avg(&mixed, "field").unwrap_err().code(),
        QueryErrorCode::TypeMismatch
    );
}

#[test]
fn test_min_max_over_mixed_field_do_not_fail() {
    let mixed = vec![json!({"field": 1}), json!({"field": "x"}), json!({"field": 3})];

    assert!(Aggregator::min(&mixed, "field").is_some());
    assert!(Aggregator::max(&mixed, "field").is_some());
}

#[test]
fn test_absent_fields_are_skipped() {
    let data = vec![json!({"age": 4}), json!({}), json!({"age": null}), json!({"age": 8})];

    assert_eq!(Aggregator::sum(&data, "age").unwrap(), 12.0);
    assert_eq!(Aggregator::avg(&data, "age").unwrap(), Some(6.0));
    assert_eq!(Aggregator::count(&data), 4);
}

// =============================================================================
// Grouping Tests
// =============================================================================

#[test]
fn test_group_by_type_and_count() {
    let data = vec![json!({"type": "a"}), json!({"type": "a"}), json!({"type": "b"})];

    let groups = Aggregator::group_by(data, &["type"]);
    let rows =
        Aggregator::apply_aggregations_to_groups(&groups, &["type"], &[Aggregation::count("n")])
            .unwrap();

    assert_eq!(
        rows,
        vec![
            Record::new().with("type", "a").with("n", 2),
            Record::new().with("type", "b").with("n", 1),
        ]
    );
}

/// Values that would collide under a delimited string key stay distinct.
#[test]
fn test_group_keys_do_not_collide() {
    let data = vec![
        json!({"a": "x|y", "b": "z"}),
        json!({"a": "x", "b": "y|z"}),
        json!({"a": 1, "b": "z"}),
        json!({"a": "1", "b": "z"}),
    ];

    let groups = Aggregator::group_by(data, &["a", "b"]);
    assert_eq!(groups.len(), 4);
}

#[test]
fn test_multiple_aggregations_per_group() {
    let data = vec![
        json!({"team": "red", "score": 3}),
        json!({"team": "blue", "score": 10}),
        json!({"team": "red", "score": 5}),
    ];

    let groups = Aggregator::group_by(data, &["team"]);
    let rows = Aggregator::apply_aggregations_to_groups(
        &groups,
        &["team"],
        &[
            Aggregation::sum("score", "total"),
            Aggregation::max("score", "best"),
            Aggregation::avg("score", "mean"),
        ],
    )
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("team"), Some(&FieldValue::from("red")));
    assert_eq!(rows[0].get("total"), Some(&FieldValue::Number(8.0)));
    assert_eq!(rows[0].get("best"), Some(&FieldValue::Number(5.0)));
    assert_eq!(rows[0].get("mean"), Some(&FieldValue::Number(4.0)));
    assert_eq!(rows[1].get("total"), Some(&FieldValue::Number(10.0)));
}
