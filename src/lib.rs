//! querylayer - A storage-agnostic query layer
//!
//! Typed condition trees, aggregation, an in-memory execution engine, and a
//! router that sends queries to native-capable adapters or falls back to
//! draining them into memory.

pub mod aggregation;
pub mod condition;
pub mod config;
pub mod errors;
pub mod executor;
pub mod observability;
pub mod query;
pub mod router;
pub mod value;

pub use condition::{Condition, ConditionValidator};
pub use config::{PaginationPolicy, QueryConfig};
pub use errors::{LayerResult, QueryError, QueryErrorCode};
pub use executor::{MemoryExecutor, QueryData, QueryResult};
pub use query::{Aggregation, OrderBy, Query};
pub use router::{AdapterDescriptor, AdapterHandle, ExecutionOptions, QueryRouter, StorageAdapter};
pub use value::{Entity, FieldValue, Record};
