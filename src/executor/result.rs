//! Result types for query execution
//!
//! Every execution path, native or in-memory, returns a `QueryResult`.

use serde::Serialize;
use uuid::Uuid;

use crate::errors::QueryError;
use crate::query::ExecutionPlan;
use crate::value::Record;

/// Result payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryData<T> {
    /// Matching entities (no grouping or aggregation)
    Entities(Vec<T>),
    /// One row per group, or a single row for ungrouped aggregations
    Rows(Vec<Record>),
}

impl<T> QueryData<T> {
    pub fn len(&self) -> usize {
        match self {
            QueryData::Entities(items) => items.len(),
            QueryData::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entities(&self) -> Option<&[T]> {
        match self {
            QueryData::Entities(items) => Some(items),
            QueryData::Rows(_) => None,
        }
    }

    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            QueryData::Rows(rows) => Some(rows),
            QueryData::Entities(_) => None,
        }
    }

    pub fn into_entities(self) -> Option<Vec<T>> {
        match self {
            QueryData::Entities(items) => Some(items),
            QueryData::Rows(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Record>> {
        match self {
            QueryData::Rows(rows) => Some(rows),
            QueryData::Entities(_) => None,
        }
    }
}

/// Execution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    /// Wall time of the execution
    pub execution_time_ms: u64,
    /// Whether the result came from a cache
    pub cache_hit: bool,
    /// Row count before pagination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
    /// Router-assigned id, shared with log lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,
}

/// Result of query execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub data: QueryData<T>,
    pub metadata: QueryMetadata,
    /// Non-fatal errors reported alongside data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<QueryError>>,
}

impl<T> QueryResult<T> {
    pub fn new(data: QueryData<T>) -> Self {
        Self {
            data,
            metadata: QueryMetadata::default(),
            errors: None,
        }
    }

    /// Result holding entities
    pub fn entities(items: Vec<T>) -> Self {
        Self::new(QueryData::Entities(items))
    }

    /// Result holding aggregate rows
    pub fn rows(rows: Vec<Record>) -> Self {
        Self::new(QueryData::Rows(rows))
    }

    pub fn with_total_count(mut self, total: usize) -> Self {
        self.metadata.total_count = Some(total);
        self
    }

    pub fn with_plan(mut self, plan: ExecutionPlan) -> Self {
        self.metadata.plan = Some(plan);
        self
    }

    pub fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.metadata.execution_time_ms = ms;
        self
    }

    /// Attaches a non-fatal error
    pub fn with_error(mut self, error: QueryError) -> Self {
        self.errors.get_or_insert_with(Vec::new).push(error);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
