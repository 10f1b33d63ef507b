//! Cost model and cheapest-first reordering
//!
//! Scores are heuristics, not cardinality estimates:
//! - equality / comparison / null check: 1
//! - pattern: 3
//! - set: max(1, log2(|values|))
//! - composite: sum of children × (and 1.2, or 1.0, not 1.5)

use std::cmp::Ordering;

use super::model::{CompositeOp, Condition};

const PATTERN_COST: f64 = 3.0;
const LEAF_COST: f64 = 1.0;

impl CompositeOp {
    /// Cost multiplier applied to the summed child cost
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            CompositeOp::And => 1.2,
            CompositeOp::Or => 1.0,
            CompositeOp::Not => 1.5,
        }
    }
}

impl Condition {
    /// Relative execution cost of this tree
    pub fn complexity(&self) -> f64 {
        match self {
            Condition::Equality { .. } | Condition::Comparison { .. } | Condition::Null { .. } => {
                LEAF_COST
            }
            Condition::Pattern { .. } => PATTERN_COST,
            Condition::Set { values, .. } => (values.len() as f64).log2().max(LEAF_COST),
            Condition::Composite {
                operator,
                conditions,
            } => {
                let total: f64 = conditions.iter().map(Condition::complexity).sum();
                total * operator.cost_multiplier()
            }
        }
    }

    /// Returns a new tree whose composite children are ordered cheapest-first.
    ///
    /// Children are optimized recursively before sorting. The sort is stable,
    /// so equal-cost children keep their relative order.
    pub fn optimize(&self) -> Condition {
        match self {
            Condition::Composite {
                operator,
                conditions,
            } => {
                let mut scored: Vec<(f64, Condition)> = conditions
                    .iter()
                    .map(|child| {
                        let optimized = child.optimize();
                        (optimized.complexity(), optimized)
                    })
                    .collect();
                scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                Condition::Composite {
                    operator: *operator,
                    conditions: scored.into_iter().map(|(_, c)| c).collect(),
                }
            }
            leaf => leaf.clone(),
        }
    }

    /// Structural equality: same variant, field, operator, and values,
    /// with child lists compared elementwise in order.
    ///
    /// Values compare by identity, so a NaN-valued condition equals itself.
    pub fn equals(&self, other: &Condition) -> bool {
        match (self, other) {
            (
                Condition::Equality { field: fa, operator: oa, value: va },
                Condition::Equality { field: fb, operator: ob, value: vb },
            ) => fa == fb && oa == ob && va.same_as(vb),
            (
                Condition::Comparison { field: fa, operator: oa, value: va },
                Condition::Comparison { field: fb, operator: ob, value: vb },
            ) => fa == fb && oa == ob && va.same_as(vb),
            (
                Condition::Set { field: fa, operator: oa, values: va },
                Condition::Set { field: fb, operator: ob, values: vb },
            ) => {
                fa == fb
                    && oa == ob
                    && va.len() == vb.len()
                    && va.iter().zip(vb.iter()).all(|(x, y)| x.same_as(y))
            }
            (
                Condition::Composite { operator: oa, conditions: ca },
                Condition::Composite { operator: ob, conditions: cb },
            ) => {
                oa == ob
                    && ca.len() == cb.len()
                    && ca.iter().zip(cb.iter()).all(|(x, y)| x.equals(y))
            }
            (a @ Condition::Pattern { .. }, b @ Condition::Pattern { .. })
            | (a @ Condition::Null { .. }, b @ Condition::Null { .. }) => a == b,
            _ => false,
        }
    }
}
