//! In-memory execution subsystem
//!
//! Runs a query over an already materialized entity sequence. Used directly,
//! or by the router when an adapter cannot execute queries natively.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate
//! 2. Filter
//! 3. Group
//! 4. Aggregate
//! 5. Having
//! 6. Order
//! 7. Paginate (offset, then limit)
//! 8. Project

mod executor;
mod filters;
mod result;
mod sorter;

pub use executor::MemoryExecutor;
pub use filters::ConditionFilter;
pub use result::{QueryData, QueryMetadata, QueryResult};
pub use sorter::ResultSorter;
