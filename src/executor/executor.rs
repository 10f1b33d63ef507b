//! In-memory query execution
//!
//! Evaluates a query over a materialized entity sequence.
//!
//! Execution flow (strict order):
//! 1. Validate the query
//! 2. Filter by the condition tree (optionally reordered cheapest-first)
//! 3. Group by the group fields, if any
//! 4. Aggregate per group, or once over the filtered set
//! 5. Filter aggregate rows by `having`
//! 6. Order by the ordering keys
//! 7. Record the total count, then apply offset and limit
//! 8. Project

use crate::aggregation::Aggregator;
use crate::config::QueryConfig;
use crate::errors::{LayerResult, QueryError};
use crate::observability::Timer;
use crate::query::{ExecutionPlan, Query, QueryValidator};
use crate::value::{Entity, Record};

use super::filters::ConditionFilter;
use super::result::{QueryData, QueryResult};
use super::sorter::ResultSorter;

/// Executes queries over in-memory data
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    config: QueryConfig,
    validator: QueryValidator,
}

impl MemoryExecutor {
    pub fn new(config: QueryConfig) -> Self {
        let validator = QueryValidator::new(&config);
        Self { config, validator }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Executes `query` over `data`.
    ///
    /// Deterministic: same query and same input order give the same result.
    pub fn execute<T: Entity>(&self, query: &Query<T>, data: Vec<T>) -> LayerResult<QueryResult<T>> {
        let timer = Timer::new();

        self.validator
            .validate(query)
            .into_result()
            .map_err(|e| e.with_query(query.to_json()))?;

        let filter_tree = query.filter_tree().map(|tree| {
            if self.config.optimize_conditions {
                tree.optimize()
            } else {
                tree
            }
        });

        let filtered = match &filter_tree {
            Some(tree) => ConditionFilter::compile(tree)?.apply(data),
            None => data,
        };

        let (data, total) = if query.is_aggregating() {
            let rows = self.aggregate(query, filtered)?;
            let (rows, total) = self.finish(query, rows)?;
            (QueryData::Rows(rows), total)
        } else {
            let (entities, total) = self.finish(query, filtered)?;
            (QueryData::Entities(entities), total)
        };

        Ok(QueryResult::new(data)
            .with_total_count(total)
            .with_plan(ExecutionPlan::memory(query, filter_tree.as_ref()))
            .with_execution_time_ms(timer.elapsed_millis()))
    }

    /// Steps 3-5: group, aggregate, having
    fn aggregate<T: Entity>(&self, query: &Query<T>, filtered: Vec<T>) -> LayerResult<Vec<Record>> {
        let aggregations = query.aggregation_list();

        let rows = match &query.group_by {
            Some(group_by) => {
                let groups = Aggregator::group_by(filtered, &group_by.fields);
                Aggregator::apply_aggregations_to_groups(&groups, &group_by.fields, aggregations)?
            }
            None => vec![Aggregator::apply_aggregations(&filtered, aggregations)?],
        };

        match &query.having {
            Some(having) => Ok(ConditionFilter::compile(having)?.apply(rows)),
            None => Ok(rows),
        }
    }

    /// Steps 6-8: order, count, paginate, project
    fn finish<T, E: Entity>(&self, query: &Query<T>, items: Vec<E>) -> LayerResult<(Vec<E>, usize)> {
        if let Some(limit) = self.config.max_result_rows {
            if items.len() > limit {
                return Err(QueryError::result_too_large(items.len(), limit)
                    .with_query(query.to_json()));
            }
        }

        let sorted = ResultSorter::sort(items, &query.ordering);
        let total = sorted.len();

        let page: Vec<E> = match query.pagination {
            Some(page) => sorted
                .into_iter()
                .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
                .collect(),
            None => sorted,
        };

        let projected = match &query.projection {
            Some(projection) => page
                .into_iter()
                .map(|item| item.project(&projection.fields))
                .collect(),
            None => page,
        };

        Ok((projected, total))
    }
}
