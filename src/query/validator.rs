//! Whole-query validation and cost estimation
//!
//! Every clause is checked independently and all issues are collected, so a
//! caller sees the full list rather than the first failure.

use std::collections::HashSet;

use crate::condition::{ConditionValidator, ValidationReport};
use crate::config::{PaginationPolicy, QueryConfig};
use crate::errors::QueryErrorCode;

use super::ast::Query;

const CONDITION_WEIGHT: f64 = 2.0;
const ORDER_WEIGHT: f64 = 1.0;
const GROUP_FIELD_WEIGHT: f64 = 5.0;
const AGGREGATION_WEIGHT: f64 = 3.0;

/// Validates queries against the configured pagination rules
#[derive(Debug, Clone)]
pub struct QueryValidator {
    pagination: PaginationPolicy,
    max_limit: Option<u64>,
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new(&QueryConfig::default())
    }
}

impl QueryValidator {
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            pagination: config.pagination,
            max_limit: config.max_limit,
        }
    }

    /// Validates every clause of `query`
    pub fn validate<T>(&self, query: &Query<T>) -> ValidationReport {
        let mut report = ValidationReport::new();

        for (i, condition) in query.conditions.iter().enumerate() {
            ConditionValidator::validate_at(condition, &format!("conditions[{}]", i), &mut report);
        }

        self.validate_ordering(query, &mut report);
        self.validate_pagination(query, &mut report);
        self.validate_projection(query, &mut report);
        self.validate_grouping(query, &mut report);
        self.validate_aggregations(query, &mut report);
        self.validate_having(query, &mut report);

        report
    }

    fn validate_ordering<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        for (i, order) in query.ordering.iter().enumerate() {
            if order.field.trim().is_empty() {
                report.add(
                    &format!("ordering[{}]", i),
                    QueryErrorCode::InvalidField,
                    "Ordering field must not be empty",
                );
            }
        }
    }

    fn validate_pagination<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        let Some(page) = query.pagination else {
            return;
        };

        if page.limit == 0 && self.pagination == PaginationPolicy::RequirePositiveLimit {
            report.add(
                "pagination.limit",
                QueryErrorCode::InvalidValue,
                "Pagination limit must be greater than zero",
            );
        }

        if let Some(max) = self.max_limit {
            if page.limit > max {
                report.add(
                    "pagination.limit",
                    QueryErrorCode::InvalidValue,
                    format!("Pagination limit {} exceeds maximum {}", page.limit, max),
                );
            }
        }
    }

    fn validate_projection<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        let Some(projection) = &query.projection else {
            return;
        };

        if projection.fields.is_empty() {
            report.add(
                "projection",
                QueryErrorCode::InvalidField,
                "Projection must list at least one field",
            );
        }
        for (i, field) in projection.fields.iter().enumerate() {
            if field.trim().is_empty() {
                report.add(
                    &format!("projection.fields[{}]", i),
                    QueryErrorCode::InvalidField,
                    "Projection field must not be empty",
                );
            }
        }
    }

    fn validate_grouping<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        let Some(group_by) = &query.group_by else {
            return;
        };

        if group_by.fields.is_empty() {
            report.add(
                "groupBy",
                QueryErrorCode::InvalidField,
                "Group by must list at least one field",
            );
        }
        for (i, field) in group_by.fields.iter().enumerate() {
            if field.trim().is_empty() {
                report.add(
                    &format!("groupBy.fields[{}]", i),
                    QueryErrorCode::InvalidField,
                    "Group by field must not be empty",
                );
            }
        }
    }

    fn validate_aggregations<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        let mut aliases = HashSet::new();

        for (i, aggregation) in query.aggregation_list().iter().enumerate() {
            let path = format!("aggregations[{}]", i);

            if aggregation.alias.trim().is_empty() {
                report.add(
                    &path,
                    QueryErrorCode::InvalidField,
                    "Aggregation alias must not be empty",
                );
            } else if !aliases.insert(aggregation.alias.as_str()) {
                report.add(
                    &path,
                    QueryErrorCode::InvalidField,
                    format!("Duplicate aggregation alias '{}'", aggregation.alias),
                );
            } else if query.group_fields().contains(&aggregation.alias) {
                report.add(
                    &path,
                    QueryErrorCode::InvalidField,
                    format!("Aggregation alias '{}' shadows a group field", aggregation.alias),
                );
            }

            match &aggregation.field {
                None if aggregation.kind.requires_field() => report.add(
                    &path,
                    QueryErrorCode::InvalidField,
                    format!("Aggregation '{}' requires a field", aggregation.kind.as_str()),
                ),
                Some(field) if field.trim().is_empty() => report.add(
                    &path,
                    QueryErrorCode::InvalidField,
                    "Aggregation field must not be empty",
                ),
                _ => {}
            }
        }
    }

    fn validate_having<T>(&self, query: &Query<T>, report: &mut ValidationReport) {
        let Some(having) = &query.having else {
            return;
        };

        ConditionValidator::validate_at(having, "having", report);

        if !query.is_aggregating() {
            report.add(
                "having",
                QueryErrorCode::InvalidField,
                "Having requires grouping or aggregations",
            );
            return;
        }

        for field in having.fields() {
            let known = query.group_fields().iter().any(|g| g == field)
                || query.aggregation_list().iter().any(|a| a.alias == field);
            if !known {
                report.add(
                    "having",
                    QueryErrorCode::InvalidField,
                    format!(
                        "Having field '{}' is neither a group field nor an aggregation alias",
                        field
                    ),
                );
            }
        }
    }
}

/// Coarse planning cost of a query.
///
/// 2 per condition, 1 per ordering key, 5 per group field, 3 per
/// aggregation, plus the tree complexity of every composite condition.
pub fn estimate_query_complexity<T>(query: &Query<T>) -> f64 {
    let composite: f64 = query
        .conditions
        .iter()
        .filter(|c| c.is_composite())
        .map(|c| c.complexity())
        .sum();

    query.conditions.len() as f64 * CONDITION_WEIGHT
        + query.ordering.len() as f64 * ORDER_WEIGHT
        + query.group_fields().len() as f64 * GROUP_FIELD_WEIGHT
        + query.aggregation_list().len() as f64 * AGGREGATION_WEIGHT
        + composite
}
