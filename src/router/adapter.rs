//! Storage adapter contract
//!
//! An adapter must be able to stream its entities. Native-capable adapters
//! additionally execute queries themselves. What an adapter can do is
//! declared once through its descriptor and captured in an `AdapterHandle`
//! at registration; the router never inspects adapters at runtime.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::errors::{QueryError, QueryErrorCode};
use crate::executor::QueryResult;
use crate::query::Query;
use crate::value::Entity;

use super::capabilities::{classify, AdapterCapabilities, AdapterKind};

/// Errors raised by adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter reported a query layer error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Any other backend failure
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    /// Wraps an arbitrary backend error
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AdapterError::Other(err.into())
    }

    /// Code of the underlying query error, if there is one
    pub fn code(&self) -> Option<QueryErrorCode> {
        match self {
            AdapterError::Query(err) => Some(err.code()),
            AdapterError::Other(_) => None,
        }
    }
}

/// Boxed future returned by adapter operations
pub type AdapterFuture<'a, R> = Pin<Box<dyn Future<Output = Result<R, AdapterError>> + Send + 'a>>;

/// Boxed stream of entities
pub type EntityStream<'a, T> = BoxStream<'a, Result<T, AdapterError>>;

/// Declared shape of an adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterDescriptor {
    /// Executes queries itself against the named database
    Native { database: String },
    /// Persists to a file
    FileBacked { path: PathBuf },
    /// Iteration only
    Plain,
    /// Shape not declared
    Unknown,
}

/// A backend the router can query
pub trait StorageAdapter<T>: Send + Sync {
    /// Declares what this adapter supports
    fn descriptor(&self) -> AdapterDescriptor;

    /// Streams every stored entity
    fn values(&self) -> EntityStream<'_, T>;

    /// Executes a query natively.
    ///
    /// Only called for adapters whose descriptor classifies as native.
    fn native_query<'a>(&'a self, query: &'a Query<T>) -> AdapterFuture<'a, QueryResult<T>> {
        let _ = query;
        Box::pin(async {
            Err(AdapterError::Query(QueryError::incompatible_operation(
                "Adapter does not support native queries",
            )))
        })
    }

    /// Persists pending changes (file-backed adapters)
    fn save(&self) -> AdapterFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// A registered adapter together with its classification
pub struct AdapterHandle<T> {
    adapter: Arc<dyn StorageAdapter<T>>,
    descriptor: AdapterDescriptor,
    kind: AdapterKind,
}

impl<T: Entity + 'static> AdapterHandle<T> {
    /// Registers an adapter, capturing its descriptor
    pub fn new(adapter: impl StorageAdapter<T> + 'static) -> Self {
        Self::from_arc(Arc::new(adapter))
    }

    /// Registers a shared adapter
    pub fn from_arc(adapter: Arc<dyn StorageAdapter<T>>) -> Self {
        let descriptor = adapter.descriptor();
        let kind = classify(&descriptor);
        Self {
            adapter,
            descriptor,
            kind,
        }
    }
}

impl<T> AdapterHandle<T> {
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    pub fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    pub fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::for_kind(self.kind)
    }

    pub fn adapter(&self) -> &dyn StorageAdapter<T> {
        self.adapter.as_ref()
    }
}

impl<T> Clone for AdapterHandle<T> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            descriptor: self.descriptor.clone(),
            kind: self.kind,
        }
    }
}

impl<T> fmt::Debug for AdapterHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("descriptor", &self.descriptor)
            .field("kind", &self.kind)
            .finish()
    }
}
