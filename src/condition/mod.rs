//! Condition subsystem
//!
//! Filter-expression trees and the operations over them.
//!
//! # Components
//!
//! - `model`: the closed set of condition variants
//! - `builder`: one factory per variant (never fails)
//! - `validate`: recursive structural validation with a structured report
//! - `optimize`: cost model and cheapest-first reordering, structural equality
//! - `display`: readable rendering for diagnostics

mod builder;
mod display;
mod model;
mod optimize;
mod validate;

pub use model::{
    ComparisonOp, CompositeOp, Condition, ConditionKind, EqualityOp, NullOp, PatternOp, SetOp,
};
pub use validate::{ConditionValidator, ValidationIssue, ValidationReport};
