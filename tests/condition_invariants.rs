//! Condition Invariant Tests
//!
//! - Optimization preserves total complexity
//! - Optimized composites order children cheapest-first, recursively
//! - Structural equality
//! - Composite arity and empty-set validation

use querylayer::condition::{CompositeOp, Condition, ConditionValidator};
use querylayer::QueryErrorCode;

fn nested_tree() -> Condition {
    Condition::and(vec![
        Condition::matches("email", "^[a-z]+@example\\.com$"),
        Condition::or(vec![
            Condition::contains("name", "ann"),
            Condition::eq("status", "active"),
            Condition::is_in("role", ["admin", "owner", "editor"]),
        ]),
        Condition::is_null("deleted_at"),
        Condition::not(Condition::gt("age", 65)),
    ])
}

fn assert_sorted(condition: &Condition) {
    let children = condition.children();
    for pair in children.windows(2) {
        assert!(
            pair[0].complexity() <= pair[1].complexity(),
            "children out of order: {} before {}",
            pair[0],
            pair[1]
        );
    }
    for child in children {
        assert_sorted(child);
    }
}

// =============================================================================
// Optimizer Tests
// =============================================================================

/// Reordering never changes the total cost.
#[test]
fn test_optimize_preserves_complexity() {
    let tree = nested_tree();
    let optimized = tree.optimize();
    assert!((optimized.complexity() - tree.complexity()).abs() < 1e-9);
}

/// Every composite's children are non-decreasing in complexity after optimize.
#[test]
fn test_optimize_orders_children_recursively() {
    let optimized = nested_tree().optimize();
    assert_sorted(&optimized);
}

/// Leaves are returned unchanged.
#[test]
fn test_optimize_leaf_is_identity() {
    let leaf = Condition::eq("id", 7);
    assert!(leaf.optimize().equals(&leaf));
}

// =============================================================================
// Equality Tests
// =============================================================================

#[test]
fn test_equals_is_reflexive() {
    let tree = nested_tree();
    assert!(tree.equals(&tree));
    assert!(tree.equals(&tree.clone()));
}

#[test]
fn test_equals_detects_differences() {
    let base = Condition::eq("age", 30);

    assert!(!base.equals(&Condition::ne("age", 30)), "operator");
    assert!(!base.equals(&Condition::eq("years", 30)), "field");
    assert!(!base.equals(&Condition::eq("age", 31)), "value");

    let a = Condition::and(vec![Condition::eq("a", 1), Condition::eq("b", 2)]);
    let b = Condition::and(vec![Condition::eq("a", 1), Condition::eq("b", 3)]);
    let c = Condition::and(vec![
        Condition::eq("a", 1),
        Condition::eq("b", 2),
        Condition::eq("c", 3),
    ]);
    assert!(!a.equals(&b), "child value");
    assert!(!a.equals(&c), "child count");
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_not_with_two_children_is_invalid() {
    let not = Condition::composite(
        CompositeOp::Not,
        vec![Condition::eq("a", 1), Condition::eq("b", 2)],
    );
    assert!(!ConditionValidator::validate(&not).is_valid());
}

#[test]
fn test_and_with_one_child_is_invalid() {
    let and = Condition::and(vec![Condition::eq("a", 1)]);
    let report = ConditionValidator::validate(&and);
    assert!(!report.is_valid());
    assert_eq!(report.issues()[0].code, QueryErrorCode::InvalidSyntax);
}

#[test]
fn test_empty_set_is_invalid() {
    let set = Condition::is_in("role", Vec::<String>::new());
    assert!(!ConditionValidator::validate(&set).is_valid());
}

#[test]
fn test_nested_issue_paths() {
    let tree = Condition::and(vec![
        Condition::eq("a", 1),
        Condition::or(vec![Condition::eq("b", 2)]),
    ]);
    let report = ConditionValidator::validate(&tree);
    assert_eq!(report.issues().len(), 1);
    assert!(report.issues()[0].path.ends_with("conditions[1]"));
}

#[test]
fn test_valid_tree_has_no_issues() {
    let report = ConditionValidator::validate(&nested_tree());
    assert!(report.is_valid(), "{:?}", report.messages());
}
