//! Router Invariant Tests
//!
//! - Descriptor classification and capability reporting
//! - Native delegation vs. fallback drain
//! - Error normalization (adapter errors, panics, resource limits)
//! - Batch execution fails as a whole
//! - Cancellation and deadlines

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use querylayer::executor::QueryResult;
use querylayer::query::{Aggregation, ExecutionStrategy, OrderBy, Query};
use querylayer::router::{
    classify, AdapterDescriptor, AdapterError, AdapterFuture, AdapterHandle, AdapterKind,
    CancellationToken, EntityStream, ExecutionOptions, InMemoryAdapter, QueryRouter,
    StorageAdapter,
};
use querylayer::{Condition, QueryConfig, QueryErrorCode};
use serde_json::{json, Value};

fn people() -> Vec<Value> {
    vec![
        json!({"name": "ada", "age": 36, "team": "core"}),
        json!({"name": "bob", "age": 19, "team": "web"}),
        json!({"name": "cy", "age": 52, "team": "core"}),
    ]
}

/// Native adapter: answers every query with a fixed entity and counts calls.
/// Queries filtering on `explode` fail.
#[derive(Default)]
struct NativeStub {
    calls: AtomicUsize,
}

impl StorageAdapter<Value> for NativeStub {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::Native {
            database: "db1".to_string(),
        }
    }

    fn values(&self) -> EntityStream<'_, Value> {
        stream::empty().boxed()
    }

    fn native_query<'a>(&'a self, query: &'a Query<Value>) -> AdapterFuture<'a, QueryResult<Value>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.conditions.iter().any(|c| c.field() == Some("explode")) {
                return Err(AdapterError::other("native engine rejected the query"));
            }
            Ok(QueryResult::entities(vec![json!({"source": "native"})]))
        })
    }
}

/// File-backed adapter over fixed entities, optionally failing mid-stream
struct FileStub {
    entities: Vec<Value>,
    fail_after: Option<usize>,
}

impl FileStub {
    fn new(entities: Vec<Value>) -> Self {
        Self {
            entities,
            fail_after: None,
        }
    }
}

impl StorageAdapter<Value> for FileStub {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::FileBacked {
            path: PathBuf::from("/x.json"),
        }
    }

    fn values(&self) -> EntityStream<'_, Value> {
        let fail_after = self.fail_after;
        stream::iter(self.entities.clone().into_iter().enumerate().map(move |(i, v)| {
            match fail_after {
                Some(n) if i >= n => Err(AdapterError::other("disk read failed")),
                _ => Ok(v),
            }
        }))
        .boxed()
    }
}

/// Plain adapter whose stream never ends
struct Endless;

impl StorageAdapter<Value> for Endless {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::Plain
    }

    fn values(&self) -> EntityStream<'_, Value> {
        stream::repeat_with(|| Ok(Value::from(1))).boxed()
    }
}

/// Native adapter that never answers
struct Hanging;

impl StorageAdapter<Value> for Hanging {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::Native {
            database: "slow".to_string(),
        }
    }

    fn values(&self) -> EntityStream<'_, Value> {
        stream::empty().boxed()
    }

    fn native_query<'a>(&'a self, _query: &'a Query<Value>) -> AdapterFuture<'a, QueryResult<Value>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(QueryResult::entities(Vec::new()))
        })
    }
}

/// Native adapter that panics
struct Panicking;

impl StorageAdapter<Value> for Panicking {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::Native {
            database: "db1".to_string(),
        }
    }

    fn values(&self) -> EntityStream<'_, Value> {
        stream::empty().boxed()
    }

    fn native_query<'a>(&'a self, _query: &'a Query<Value>) -> AdapterFuture<'a, QueryResult<Value>> {
        Box::pin(async {
            let rows: Vec<Value> = Vec::new();
            let first = rows
                .first()
                .cloned()
                .unwrap_or_else(|| panic!("adapter exploded"));
            Ok(QueryResult::entities(vec![first]))
        })
    }
}

// =============================================================================
// Classification Tests
// =============================================================================

#[test]
fn test_classification() {
    let native = AdapterDescriptor::Native {
        database: "db1".to_string(),
    };
    let file = AdapterDescriptor::FileBacked {
        path: PathBuf::from("/x.json"),
    };

    assert_eq!(classify(&native), AdapterKind::Native);
    assert_eq!(classify(&file), AdapterKind::FileBacked);
    assert_eq!(classify(&AdapterDescriptor::Plain), AdapterKind::Plain);
}

#[test]
fn test_capabilities_reported_by_router() {
    let router = QueryRouter::default();

    let native = router.capabilities(&AdapterHandle::new(NativeStub::default()));
    assert!(native.native_query && native.indexing);

    let file = router.capabilities(&AdapterHandle::new(FileStub::new(people())));
    assert!(!file.native_query && !file.indexing);
    assert!(file.aggregation);
    assert!(!file.streaming && !file.caching);
}

// =============================================================================
// Routing Tests
// =============================================================================

#[tokio::test]
async fn test_native_adapter_receives_query() {
    let adapter = Arc::new(NativeStub::default());
    let handle = AdapterHandle::from_arc(adapter.clone());
    let router = QueryRouter::default();

    let result = router
        .execute(&Query::new().filter(Condition::eq("age", 36)), &handle)
        .await
        .unwrap();

    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.data.entities().unwrap(), &[json!({"source": "native"})]);
    let plan = result.metadata.plan.unwrap();
    assert_eq!(plan.strategy, ExecutionStrategy::Native);
    assert_eq!(router.metrics().snapshot().native_executions, 1);
}

#[tokio::test]
async fn test_file_backed_adapter_uses_fallback() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(FileStub::new(people()));
    let query = Query::new()
        .filter(Condition::eq("team", "core"))
        .order_by(OrderBy::desc("age"));

    let result = router.execute(&query, &handle).await.unwrap();
    let names: Vec<&str> = result
        .data
        .entities()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["cy", "ada"]);

    let plan = result.metadata.plan.unwrap();
    assert_eq!(plan.strategy, ExecutionStrategy::Memory);
    assert_eq!(plan.adapter_kind, Some(AdapterKind::FileBacked));
    assert_eq!(plan.steps[0], "scan file_backed");
}

#[tokio::test]
async fn test_fallback_aggregation() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));
    let query = Query::new()
        .group_by(["team"])
        .aggregate(Aggregation::avg("age", "avg_age"));

    let result = router.execute(&query, &handle).await.unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.metadata.execution_id.is_some());
}

// =============================================================================
// Error Normalization Tests
// =============================================================================

#[tokio::test]
async fn test_native_failure_becomes_adapter_error() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(NativeStub::default());
    let query = Query::new().filter(Condition::eq("explode", true));

    let err = router.execute(&query, &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::AdapterError);
    assert_eq!(err.detail("adapter_kind"), Some(&json!("native")));
    assert_eq!(
        err.detail("cause_message"),
        Some(&json!("native engine rejected the query"))
    );
}

#[tokio::test]
async fn test_iteration_failure_becomes_adapter_error() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(FileStub {
        entities: people(),
        fail_after: Some(1),
    });

    let err = router.execute(&Query::new(), &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::AdapterError);
    assert_eq!(err.detail("adapter_kind"), Some(&json!("file_backed")));
}

#[tokio::test]
async fn test_fallback_failure_keeps_cause_code() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));
    let query = Query::new().aggregate(Aggregation::sum("name", "total"));

    let err = router.execute(&query, &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::AdapterError);
    assert_eq!(err.detail("adapter_kind"), Some(&json!("plain")));
    assert_eq!(err.detail("cause_code"), Some(&json!("TYPE_MISMATCH")));
}

#[tokio::test]
async fn test_result_limit_passes_through() {
    let router = QueryRouter::new(QueryConfig::default().with_max_result_rows(2));
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));

    let err = router.execute(&Query::new(), &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::ResultTooLarge);
}

#[tokio::test]
async fn test_panic_becomes_execution_failed() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(Panicking);

    let err = router.execute(&Query::new(), &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::ExecutionFailed);
    assert!(err.message().contains("adapter exploded"));
}

#[tokio::test]
async fn test_drain_bound_is_memory_limit() {
    let router = QueryRouter::new(QueryConfig::default().with_max_materialized_entities(100));
    let handle = AdapterHandle::new(Endless);

    let err = router.execute(&Query::new(), &handle).await.unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::MemoryLimit);
    assert_eq!(err.detail("limit"), Some(&json!(100)));
}

// =============================================================================
// Batch Tests
// =============================================================================

#[tokio::test]
async fn test_execute_all_keeps_input_order() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));
    let queries = vec![
        Query::new().filter(Condition::eq("name", "cy")),
        Query::new().filter(Condition::eq("name", "ada")),
        Query::new().filter(Condition::eq("name", "bob")),
    ];

    let results = router
        .execute_all(&queries, &handle, &ExecutionOptions::default())
        .await
        .unwrap();
    let names: Vec<&str> = results
        .iter()
        .map(|r| r.data.entities().unwrap()[0]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["cy", "ada", "bob"]);
}

#[tokio::test]
async fn test_execute_all_fails_as_a_whole() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(NativeStub::default());
    let queries = vec![
        Query::new().filter(Condition::eq("age", 1)),
        Query::new().filter(Condition::eq("explode", true)),
        Query::new().filter(Condition::eq("age", 3)),
    ];

    let err = router
        .execute_all(&queries, &handle, &ExecutionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), QueryErrorCode::ExecutionFailed);
    assert_eq!(err.detail("batchSize"), Some(&json!(3)));
    assert_eq!(err.detail("failedIndex"), Some(&json!(1)));
    assert_eq!(err.detail("cause").unwrap()["code"], json!("ADAPTER_ERROR"));

    let snapshot = router.metrics().snapshot();
    assert_eq!(snapshot.batches_failed, 1);
    assert_eq!(snapshot.queries_failed, 1);
    assert_eq!(snapshot.queries_executed, 2);
}

// =============================================================================
// Cancellation and Deadline Tests
// =============================================================================

#[tokio::test]
async fn test_deadline_on_native_call() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(Hanging);
    let options = ExecutionOptions::new().with_timeout(Duration::from_millis(50));

    let err = router
        .execute_with(&Query::new(), &handle, &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::Timeout);
    assert_eq!(err.detail("reason"), Some(&json!("deadline")));
    assert_eq!(err.detail("timeout_ms"), Some(&json!(50)));
}

#[tokio::test]
async fn test_query_hint_shortens_deadline() {
    let router = QueryRouter::new(QueryConfig::default().with_default_timeout_ms(60_000));
    let handle = AdapterHandle::new(Hanging);

    let err = router
        .execute(&Query::new().with_timeout_ms(30), &handle)
        .await
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::Timeout);
    assert_eq!(err.detail("timeout_ms"), Some(&json!(30)));
}

/// A stream that is always ready is still bounded by the deadline.
#[tokio::test]
async fn test_deadline_on_endless_drain() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(Endless);
    let options = ExecutionOptions::new().with_timeout(Duration::from_millis(20));

    let err = router
        .execute_with(&Query::new(), &handle, &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::Timeout);
    assert_eq!(err.detail("reason"), Some(&json!("deadline")));
}

/// A timeout too large to schedule behaves as no deadline at all.
#[tokio::test]
async fn test_unrepresentable_timeout_is_unbounded() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));
    let options = ExecutionOptions::new().with_timeout(Duration::MAX);

    let result = router
        .execute_with(&Query::new(), &handle, &options)
        .await
        .unwrap();
    assert_eq!(result.len(), 3);

    let results = router
        .execute_all(&[Query::new().with_timeout_ms(u64::MAX)], &handle, &options)
        .await
        .unwrap();
    assert_eq!(results[0].len(), 3);
}

#[tokio::test]
async fn test_cancel_during_native_call() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(Hanging);
    let token = CancellationToken::new();
    let options = ExecutionOptions::new().with_cancel(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = router
        .execute_with(&Query::new(), &handle, &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::Timeout);
    assert_eq!(err.detail("reason"), Some(&json!("cancelled")));
}

#[tokio::test]
async fn test_cancelled_token_fails_batch() {
    let router = QueryRouter::default();
    let handle = AdapterHandle::new(InMemoryAdapter::new(people()));
    let token = CancellationToken::new();
    token.cancel();
    let options = ExecutionOptions::new().with_cancel(token);

    let err = router
        .execute_all(&[Query::new(), Query::new()], &handle, &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::ExecutionFailed);
    assert_eq!(err.detail("cause").unwrap()["code"], json!("TIMEOUT"));
}
