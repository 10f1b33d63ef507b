//! Query structures
//!
//! A `Query<T>` is an immutable description of what to fetch from a store of
//! `T` entities. `conditions` and `ordering` are always present (possibly
//! empty); every other clause is optional and validated independently.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::errors::{LayerResult, QueryError};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Placement of null and absent values in an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
    /// Null placement; when unset nulls sort lowest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            nulls: None,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }
}

/// Offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// First page of `limit` rows
    pub fn first(limit: u64) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Field allow-list for returned entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub fields: Vec<String>,
}

/// Grouping fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    pub fields: Vec<String>,
}

/// Aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Count => "count",
            AggregationType::CountDistinct => "count_distinct",
            AggregationType::Sum => "sum",
            AggregationType::Avg => "avg",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
        }
    }

    /// Every type but `count` needs a field
    pub fn requires_field(&self) -> bool {
        !matches!(self, AggregationType::Count)
    }
}

/// One aggregation, keyed in the result by `alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(rename = "type")]
    pub kind: AggregationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub alias: String,
}

impl Aggregation {
    pub fn new(kind: AggregationType, field: Option<&str>, alias: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.map(str::to_string),
            alias: alias.into(),
        }
    }

    pub fn count(alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Count, None, alias)
    }

    pub fn count_distinct(field: &str, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::CountDistinct, Some(field), alias)
    }

    pub fn sum(field: &str, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Sum, Some(field), alias)
    }

    pub fn avg(field: &str, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Avg, Some(field), alias)
    }

    pub fn min(field: &str, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Min, Some(field), alias)
    }

    pub fn max(field: &str, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Max, Some(field), alias)
    }
}

/// Execution hints; advisory except for the deadline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHints {
    /// Per-query deadline in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Index a native adapter should prefer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_hint: Option<String>,
}

/// A declarative query over entities of type `T`
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Query<T> {
    /// Filter conditions (implicit AND)
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Ordering keys, most significant first
    #[serde(default)]
    pub ordering: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, rename = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<Aggregation>>,
    /// Post-aggregation filter; fields may name aggregation aliases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Condition>,
    /// Depth hint for projection-aware adapters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<QueryHints>,
    #[serde(skip)]
    entity: PhantomData<fn() -> T>,
}

impl<T> Query<T> {
    /// Creates an empty query (matches everything)
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            ordering: Vec::new(),
            projection: None,
            pagination: None,
            group_by: None,
            aggregations: None,
            having: None,
            depth: None,
            hints: None,
            entity: PhantomData,
        }
    }

    /// Adds a filter condition
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds an ordering key
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.ordering.push(order);
        self
    }

    /// Sets the pagination window
    pub fn paginate(mut self, limit: u64, offset: u64) -> Self {
        self.pagination = Some(Pagination::new(limit, offset));
        self
    }

    /// Sets the projection
    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(Projection {
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Sets the grouping fields
    pub fn group_by<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group_by = Some(GroupBy {
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds an aggregation
    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.get_or_insert_with(Vec::new).push(aggregation);
        self
    }

    /// Sets the post-aggregation filter
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = Some(condition);
        self
    }

    /// Sets the depth hint
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Sets execution hints
    pub fn with_hints(mut self, hints: QueryHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Sets a per-query deadline
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.hints.get_or_insert_with(QueryHints::default).timeout_ms = Some(ms);
        self
    }

    /// Returns true if the query groups or aggregates
    pub fn is_aggregating(&self) -> bool {
        self.group_by.is_some() || self.aggregations.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// The top-level conditions as one tree, or `None` if there are none
    pub fn filter_tree(&self) -> Option<Condition> {
        match self.conditions.len() {
            0 => None,
            1 => Some(self.conditions[0].clone()),
            _ => Some(Condition::and(self.conditions.clone())),
        }
    }

    /// Group fields, or an empty slice when ungrouped
    pub fn group_fields(&self) -> &[String] {
        self.group_by.as_ref().map(|g| g.fields.as_slice()).unwrap_or(&[])
    }

    /// Aggregations, or an empty slice when none
    pub fn aggregation_list(&self) -> &[Aggregation] {
        self.aggregations.as_deref().unwrap_or(&[])
    }

    /// Renders the query as JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Parses a query from untyped JSON
    pub fn from_json(value: &Value) -> LayerResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| QueryError::invalid_syntax(format!("Malformed query: {}", e)))
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ordering: self.ordering.clone(),
            projection: self.projection.clone(),
            pagination: self.pagination,
            group_by: self.group_by.clone(),
            aggregations: self.aggregations.clone(),
            having: self.having.clone(),
            depth: self.depth,
            hints: self.hints.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("conditions", &self.conditions)
            .field("ordering", &self.ordering)
            .field("projection", &self.projection)
            .field("pagination", &self.pagination)
            .field("group_by", &self.group_by)
            .field("aggregations", &self.aggregations)
            .field("having", &self.having)
            .field("depth", &self.depth)
            .field("hints", &self.hints)
            .finish()
    }
}
