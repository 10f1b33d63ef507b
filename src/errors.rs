//! Query layer error types
//!
//! Every public entry point either succeeds or fails with a `QueryError`
//! carrying one of the closed codes below.
//!
//! Error codes:
//! - INVALID_SYNTAX, INVALID_FIELD, INVALID_OPERATOR, INVALID_VALUE (REJECT)
//! - TYPE_MISMATCH, INCOMPATIBLE_OPERATION (REJECT)
//! - EXECUTION_FAILED, ADAPTER_ERROR, TIMEOUT (ERROR)
//! - MEMORY_LIMIT, RESULT_TOO_LARGE (ERROR)

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The query itself is at fault and was rejected
    Reject,
    /// Execution failed; the query may succeed later
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Broad family an error code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Semantic,
    Runtime,
    Resource,
}

/// Closed set of error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryErrorCode {
    /// Malformed query or condition structure
    InvalidSyntax,
    /// Unknown or disallowed field reference
    InvalidField,
    /// Operator not allowed for the condition kind
    InvalidOperator,
    /// Missing or ill-typed value
    InvalidValue,
    /// Operation applied to values of the wrong type
    TypeMismatch,
    /// The adapter cannot perform the requested operation
    IncompatibleOperation,
    /// Generic execution failure
    ExecutionFailed,
    /// Failure attributable to the storage backend
    AdapterError,
    /// Deadline passed or execution was cancelled
    Timeout,
    /// Materialized data exceeded the configured bound
    MemoryLimit,
    /// Result exceeded the configured bound
    ResultTooLarge,
}

impl QueryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::InvalidSyntax => "INVALID_SYNTAX",
            QueryErrorCode::InvalidField => "INVALID_FIELD",
            QueryErrorCode::InvalidOperator => "INVALID_OPERATOR",
            QueryErrorCode::InvalidValue => "INVALID_VALUE",
            QueryErrorCode::TypeMismatch => "TYPE_MISMATCH",
            QueryErrorCode::IncompatibleOperation => "INCOMPATIBLE_OPERATION",
            QueryErrorCode::ExecutionFailed => "EXECUTION_FAILED",
            QueryErrorCode::AdapterError => "ADAPTER_ERROR",
            QueryErrorCode::Timeout => "TIMEOUT",
            QueryErrorCode::MemoryLimit => "MEMORY_LIMIT",
            QueryErrorCode::ResultTooLarge => "RESULT_TOO_LARGE",
        }
    }

    /// Returns the category of this code
    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryErrorCode::InvalidSyntax
            | QueryErrorCode::InvalidField
            | QueryErrorCode::InvalidOperator
            | QueryErrorCode::InvalidValue => ErrorCategory::Syntax,
            QueryErrorCode::TypeMismatch | QueryErrorCode::IncompatibleOperation => {
                ErrorCategory::Semantic
            }
            QueryErrorCode::ExecutionFailed
            | QueryErrorCode::AdapterError
            | QueryErrorCode::Timeout => ErrorCategory::Runtime,
            QueryErrorCode::MemoryLimit | QueryErrorCode::ResultTooLarge => {
                ErrorCategory::Resource
            }
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self.category() {
            ErrorCategory::Syntax | ErrorCategory::Semantic => Severity::Reject,
            ErrorCategory::Runtime | ErrorCategory::Resource => Severity::Error,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error with full context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
    /// Structured context
    #[serde(skip_serializing_if = "Map::is_empty")]
    details: Map<String, Value>,
    /// Echo of the query that failed, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<Value>,
}

impl QueryError {
    /// Create an error with the given code
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Map::new(),
            query: None,
        }
    }

    /// Create an invalid syntax error
    pub fn invalid_syntax(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InvalidSyntax, reason)
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let f = field.into();
        Self::new(
            QueryErrorCode::InvalidField,
            format!("Field '{}': {}", f, reason.into()),
        )
        .with_detail("field", f)
    }

    /// Create an invalid operator error
    pub fn invalid_operator(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InvalidOperator, reason)
    }

    /// Create an invalid value error
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InvalidValue, reason)
    }

    /// Create a type mismatch error
    pub fn type_mismatch(field: impl Into<String>, expected: &str, found: &str) -> Self {
        let f = field.into();
        Self::new(
            QueryErrorCode::TypeMismatch,
            format!("Field '{}' must be {}, found {}", f, expected, found),
        )
        .with_detail("field", f)
        .with_detail("expected", expected)
        .with_detail("found", found)
    }

    /// Create an incompatible operation error
    pub fn incompatible_operation(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::IncompatibleOperation, reason)
    }

    /// Create an execution failed error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::ExecutionFailed, reason)
    }

    /// Create an adapter error
    pub fn adapter_error(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::AdapterError, reason)
    }

    /// Create a timeout error
    pub fn timeout(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Timeout, reason)
    }

    /// Create a memory limit error
    pub fn memory_limit(limit: usize) -> Self {
        Self::new(
            QueryErrorCode::MemoryLimit,
            format!("Materialized entity count exceeds limit of {}", limit),
        )
        .with_detail("limit", limit)
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, limit: usize) -> Self {
        Self::new(
            QueryErrorCode::ResultTooLarge,
            format!("Result of {} rows exceeds limit of {}", rows, limit),
        )
        .with_detail("rows", rows)
        .with_detail("limit", limit)
    }

    /// Attach a structured detail
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach the originating query
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured details
    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// Returns one detail by key
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Returns the echoed query, if any
    pub fn query(&self) -> Option<&Value> {
        self.query.as_ref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for query layer operations
pub type LayerResult<T> = Result<T, QueryError>;
