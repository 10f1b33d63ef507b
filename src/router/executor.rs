//! Query routing
//!
//! Dispatches a query to the adapter's native engine when it has one, and
//! otherwise drains the adapter and evaluates the query in memory.
//!
//! Every failure leaves the router as a `QueryError`:
//! - validation errors pass through unchanged
//! - adapter and fallback failures become `ADAPTER_ERROR` with the cause attached
//! - panics become `EXECUTION_FAILED`
//! - cancellation and deadlines become `TIMEOUT`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use futures_util::{FutureExt, StreamExt};
use serde_json::Value;
use uuid::Uuid;

use crate::config::QueryConfig;
use crate::errors::{ErrorCategory, LayerResult, QueryError};
use crate::executor::{MemoryExecutor, QueryResult};
use crate::observability::{
    log_event_with_fields, Event, MetricsRegistry, ObservationScope, Timer,
};
use crate::query::{ExecutionPlan, Query, QueryValidator};
use crate::value::Entity;

use super::adapter::{AdapterError, AdapterHandle};
use super::cancel::{CancellationToken, ExecutionOptions};
use super::capabilities::{AdapterCapabilities, AdapterKind};

const BATCH_EVENTS: [Event; 3] = [Event::BatchBegin, Event::BatchComplete, Event::BatchFailed];

/// Absolute deadline for one execution
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Duration,
    at: Instant,
}

impl Deadline {
    /// `None` when the limit lies beyond what `Instant` can represent
    fn starting_now(limit: Duration) -> Option<Self> {
        let at = Instant::now().checked_add(limit)?;
        Some(Self { limit, at })
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    fn error(&self) -> QueryError {
        let ms = u64::try_from(self.limit.as_millis()).unwrap_or(u64::MAX);
        QueryError::timeout(format!("Query exceeded deadline of {}ms", ms))
            .with_detail("reason", "deadline")
            .with_detail("timeout_ms", ms)
    }
}

fn cancelled_error() -> QueryError {
    QueryError::timeout("Query was cancelled").with_detail("reason", "cancelled")
}

/// Wraps a backend failure with the adapter classification
fn adapter_failure(kind: AdapterKind, err: AdapterError) -> QueryError {
    let wrapped = QueryError::adapter_error(format!("{} adapter failed: {}", kind.as_str(), err))
        .with_detail("adapter_kind", kind.as_str());

    match err {
        AdapterError::Query(cause) => wrapped
            .with_detail("cause_code", cause.code().code())
            .with_detail("cause_message", cause.message()),
        AdapterError::Other(cause) => wrapped.with_detail("cause_message", cause.to_string()),
    }
}

/// Wraps a fallback failure; resource limits keep their own code
fn fallback_failure(kind: AdapterKind, err: QueryError) -> QueryError {
    if err.code().category() == ErrorCategory::Resource {
        return err.with_detail("adapter_kind", kind.as_str());
    }
    adapter_failure(kind, AdapterError::Query(err))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Routes queries to adapters
///
/// ```ignore
/// let router = QueryRouter::new(QueryConfig::default());
/// let handle = AdapterHandle::new(InMemoryAdapter::new(entities));
/// let result = router.execute(&query, &handle).await?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryRouter {
    config: QueryConfig,
    validator: QueryValidator,
    memory: MemoryExecutor,
    metrics: Arc<MetricsRegistry>,
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryRouter {
    pub fn new(config: QueryConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRegistry::new()))
    }

    /// Router reporting into a shared registry
    pub fn with_metrics(config: QueryConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            validator: QueryValidator::new(&config),
            memory: MemoryExecutor::new(config.clone()),
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// What `handle` supports through this router
    pub fn capabilities<T>(&self, handle: &AdapterHandle<T>) -> AdapterCapabilities {
        handle.capabilities()
    }

    /// Executes one query with default options
    pub async fn execute<T: Entity>(
        &self,
        query: &Query<T>,
        handle: &AdapterHandle<T>,
    ) -> LayerResult<QueryResult<T>> {
        self.execute_with(query, handle, &ExecutionOptions::default())
            .await
    }

    /// Executes one query under a cancellation token and/or deadline
    pub async fn execute_with<T: Entity>(
        &self,
        query: &Query<T>,
        handle: &AdapterHandle<T>,
        options: &ExecutionOptions,
    ) -> LayerResult<QueryResult<T>> {
        let execution_id = Uuid::new_v4();
        let id = execution_id.to_string();
        let timer = Timer::new();
        let kind = handle.kind();

        log_event_with_fields(
            Event::QueryReceived,
            &[("execution_id", id.as_str()), ("adapter_kind", kind.as_str())],
        );

        match self.run(query, handle, options, &id).await {
            Ok(mut result) => {
                result.metadata.execution_id = Some(execution_id);
                result.metadata.execution_time_ms = timer.elapsed_millis();
                self.metrics.increment_queries_executed();

                let rows = result.len().to_string();
                let elapsed = timer.elapsed_ms();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("execution_id", id.as_str()),
                        ("rows", rows.as_str()),
                        ("elapsed_ms", elapsed.as_str()),
                    ],
                );
                Ok(result)
            }
            Err(err) => {
                self.metrics.increment_queries_failed();
                log_event_with_fields(
                    Event::QueryFailed,
                    &[
                        ("execution_id", id.as_str()),
                        ("code", err.code().code()),
                        ("message", err.message()),
                    ],
                );
                Err(err.with_detail("execution_id", id))
            }
        }
    }

    /// Executes every query against the same adapter.
    ///
    /// Queries are interleaved on the calling task; results keep input order.
    /// Any failure fails the whole batch.
    pub async fn execute_all<T: Entity>(
        &self,
        queries: &[Query<T>],
        handle: &AdapterHandle<T>,
        options: &ExecutionOptions,
    ) -> LayerResult<Vec<QueryResult<T>>> {
        let batch_size = queries.len();
        let scope = ObservationScope::new(BATCH_EVENTS, vec![("batch_size", batch_size.to_string())]);
        self.metrics.increment_batches_executed();

        let outcomes = join_all(
            queries
                .iter()
                .map(|query| self.execute_with(query, handle, options)),
        )
        .await;

        let mut results = Vec::with_capacity(batch_size);
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(result) => results.push(result),
                Err(cause) => {
                    self.metrics.increment_batches_failed();
                    scope.fail(cause.code().code());
                    let cause_json = serde_json::to_value(&cause).unwrap_or(Value::Null);
                    return Err(QueryError::execution_failed(format!(
                        "Batch of {} queries failed at index {}: {}",
                        batch_size,
                        index,
                        cause.message()
                    ))
                    .with_detail("batchSize", batch_size)
                    .with_detail("failedIndex", index)
                    .with_detail("cause", cause_json));
                }
            }
        }

        scope.complete();
        Ok(results)
    }

    /// Validation, then the guarded route under cancellation and deadline
    async fn run<T: Entity>(
        &self,
        query: &Query<T>,
        handle: &AdapterHandle<T>,
        options: &ExecutionOptions,
        id: &str,
    ) -> LayerResult<QueryResult<T>> {
        self.validator
            .validate(query)
            .into_result()
            .map_err(|e| e.with_query(query.to_json()))?;

        let deadline = self
            .effective_timeout(query, options)
            .and_then(Deadline::starting_now);
        let cancel = options.cancel.as_ref();
        let kind = handle.kind();

        let guarded = async {
            match AssertUnwindSafe(self.route(query, handle, deadline, cancel, id))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(payload) => Err(QueryError::execution_failed(format!(
                    "Execution panicked: {}",
                    panic_message(payload.as_ref())
                ))
                .with_detail("adapter_kind", kind.as_str())),
            }
        };

        let timed = async {
            match deadline {
                Some(deadline) => tokio::time::timeout(deadline.limit, guarded)
                    .await
                    .unwrap_or_else(|_| Err(deadline.error())),
                None => guarded.await,
            }
        };

        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(cancelled_error()),
                    outcome = timed => outcome,
                }
            }
            None => timed.await,
        }
    }

    /// Options override the configured default; the query hint can only shorten it
    fn effective_timeout<T>(&self, query: &Query<T>, options: &ExecutionOptions) -> Option<Duration> {
        let base = options
            .timeout
            .or_else(|| self.config.default_timeout_ms.map(Duration::from_millis));
        let hinted = query
            .hints
            .as_ref()
            .and_then(|h| h.timeout_ms)
            .map(Duration::from_millis);

        match (base, hinted) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn route<T: Entity>(
        &self,
        query: &Query<T>,
        handle: &AdapterHandle<T>,
        deadline: Option<Deadline>,
        cancel: Option<&CancellationToken>,
        id: &str,
    ) -> LayerResult<QueryResult<T>> {
        let kind = handle.kind();
        let path = if kind.is_native() { "native" } else { "fallback" };
        log_event_with_fields(
            Event::QueryRouted,
            &[
                ("execution_id", id),
                ("adapter_kind", kind.as_str()),
                ("path", path),
            ],
        );

        if kind.is_native() {
            self.metrics.increment_native_executions();
            let mut result = handle
                .adapter()
                .native_query(query)
                .await
                .map_err(|e| adapter_failure(kind, e))?;
            if result.metadata.plan.is_none() {
                result.metadata.plan = Some(ExecutionPlan::native(query));
            }
            return Ok(result);
        }

        self.metrics.increment_fallback_executions();
        let data = self.drain(handle, deadline, cancel).await?;

        let scanned = data.len().to_string();
        log_event_with_fields(
            Event::AdapterDrainComplete,
            &[("execution_id", id), ("entities", scanned.as_str())],
        );

        let mut result = self
            .memory
            .execute(query, data)
            .map_err(|e| fallback_failure(kind, e))?;
        result.metadata.plan = result.metadata.plan.take().map(|p| p.with_adapter_kind(kind));
        Ok(result)
    }

    /// Materializes every entity, checking cancellation, deadline and the drain bound per item
    async fn drain<T: Entity>(
        &self,
        handle: &AdapterHandle<T>,
        deadline: Option<Deadline>,
        cancel: Option<&CancellationToken>,
    ) -> LayerResult<Vec<T>> {
        let kind = handle.kind();
        let mut stream = handle.adapter().values();
        let mut data = Vec::new();

        while let Some(item) = stream.next().await {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(cancelled_error());
            }
            if let Some(deadline) = deadline.filter(Deadline::expired) {
                return Err(deadline.error());
            }

            let entity = item.map_err(|e| adapter_failure(kind, e))?;
            if let Some(limit) = self.config.max_materialized_entities {
                if data.len() >= limit {
                    return Err(QueryError::memory_limit(limit)
                        .with_detail("adapter_kind", kind.as_str()));
                }
            }
            data.push(entity);
        }

        self.metrics
            .add_entities_scanned(u64::try_from(data.len()).unwrap_or(u64::MAX));
        Ok(data)
    }
}
