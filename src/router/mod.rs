//! Adapter routing
//!
//! - Adapters declare their shape once through an `AdapterDescriptor`
//! - `QueryRouter` sends native-capable adapters their queries directly
//! - Everything else is drained and evaluated by the `MemoryExecutor`
//! - Executions accept a `CancellationToken` and a deadline
//!
//! # Usage
//!
//! ```ignore
//! use querylayer::router::{AdapterHandle, InMemoryAdapter, QueryRouter};
//!
//! let router = QueryRouter::default();
//! let handle = AdapterHandle::new(InMemoryAdapter::new(entities));
//! let results = router.execute_all(&queries, &handle, &Default::default()).await?;
//! ```

mod adapter;
mod cancel;
mod capabilities;
mod executor;
mod memory_adapter;

pub use adapter::{
    AdapterDescriptor, AdapterError, AdapterFuture, AdapterHandle, EntityStream, StorageAdapter,
};
pub use cancel::{CancellationToken, ExecutionOptions};
pub use capabilities::{classify, AdapterCapabilities, AdapterKind};
pub use executor::QueryRouter;
pub use memory_adapter::InMemoryAdapter;
