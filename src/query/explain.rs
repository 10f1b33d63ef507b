//! Execution plan output
//!
//! Produces a deterministic, human-readable description of how a query was
//! fulfilled. Attached to result metadata.

use std::fmt;

use serde::Serialize;

use crate::condition::Condition;
use crate::router::AdapterKind;

use super::ast::Query;
use super::validator::estimate_query_complexity;

/// How a query is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// Delegated to the adapter's own query method
    Native,
    /// Drained and evaluated by the memory executor
    Memory,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Native => "native",
            ExecutionStrategy::Memory => "memory",
        }
    }
}

/// Explain output for one execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub strategy: ExecutionStrategy,
    /// Classification of the adapter, when routed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_kind: Option<AdapterKind>,
    /// Pipeline stages in execution order
    pub steps: Vec<String>,
    /// Coarse planning cost
    pub estimated_cost: f64,
    /// Rendered filter tree as evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ExecutionPlan {
    /// Plan for a query handed to a native adapter
    pub fn native<T>(query: &Query<T>) -> Self {
        Self {
            strategy: ExecutionStrategy::Native,
            adapter_kind: Some(AdapterKind::Native),
            steps: vec!["native_query".to_string()],
            estimated_cost: estimate_query_complexity(query),
            filter: query.filter_tree().map(|c| c.to_string()),
        }
    }

    /// Plan for in-memory evaluation; `filter` is the tree actually evaluated
    pub fn memory<T>(query: &Query<T>, filter: Option<&Condition>) -> Self {
        let mut steps = Vec::new();
        if filter.is_some() {
            steps.push("filter".to_string());
        }
        if query.group_by.is_some() {
            steps.push(format!("group [{}]", query.group_fields().join(", ")));
        }
        if !query.aggregation_list().is_empty() {
            let aliases: Vec<&str> = query
                .aggregation_list()
                .iter()
                .map(|a| a.alias.as_str())
                .collect();
            steps.push(format!("aggregate [{}]", aliases.join(", ")));
        }
        if let Some(having) = &query.having {
            steps.push(format!("having {}", having));
        }
        if !query.ordering.is_empty() {
            let keys: Vec<String> = query
                .ordering
                .iter()
                .map(|o| format!("{} {}", o.field, o.direction.as_str()))
                .collect();
            steps.push(format!("sort [{}]", keys.join(", ")));
        }
        if let Some(page) = query.pagination {
            steps.push(format!("paginate offset={} limit={}", page.offset, page.limit));
        }
        if let Some(projection) = &query.projection {
            steps.push(format!("project [{}]", projection.fields.join(", ")));
        }

        Self {
            strategy: ExecutionStrategy::Memory,
            adapter_kind: None,
            steps,
            estimated_cost: estimate_query_complexity(query),
            filter: filter.map(|c| c.to_string()),
        }
    }

    /// Records the adapter the plan was routed through
    pub fn with_adapter_kind(mut self, kind: AdapterKind) -> Self {
        self.adapter_kind = Some(kind);
        if self.strategy == ExecutionStrategy::Memory {
            self.steps.insert(0, format!("scan {}", kind.as_str()));
        }
        self
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXECUTION PLAN ===")?;
        writeln!(f, "Strategy: {}", self.strategy.as_str())?;
        if let Some(kind) = self.adapter_kind {
            writeln!(f, "Adapter: {}", kind.as_str())?;
        }
        if let Some(filter) = &self.filter {
            writeln!(f, "Filter: {}", filter)?;
        }
        if !self.steps.is_empty() {
            writeln!(f, "Steps:")?;
            for step in &self.steps {
                writeln!(f, "  - {}", step)?;
            }
        }
        writeln!(f, "Estimated Cost: {}", self.estimated_cost)
    }
}
