//! Aggregation engine
//!
//! Pure functions over entity sequences: count, count-distinct, sum, avg,
//! min, max, plus grouping by a composite key and per-group aggregation.
//!
//! `sum` and `avg` require every present value to be a number and fail with
//! `TYPE_MISMATCH` otherwise. `min` and `max` accept any kinds.

mod functions;
mod grouping;

pub use functions::Aggregator;
pub use grouping::{Group, GroupKey};
