//! Query subsystem
//!
//! Declarative query values over a generic entity type, whole-query
//! validation, cost estimation, and explain output.

mod ast;
mod explain;
mod validator;

pub use ast::{
    Aggregation, AggregationType, GroupBy, NullsOrder, OrderBy, Pagination, Projection, Query,
    QueryHints, SortDirection,
};
pub use explain::{ExecutionPlan, ExecutionStrategy};
pub use validator::{estimate_query_complexity, QueryValidator};
