//! Aggregate functions over an entity sequence
//!
//! - `count`: sequence length
//! - `count_distinct`: distinct present, non-null values (lists and objects compare by content)
//! - `sum` / `avg`: numeric only; NaN entries are skipped
//! - `min` / `max`: any kinds, using the total value order

use std::collections::HashSet;

use crate::errors::{LayerResult, QueryError};
use crate::query::{Aggregation, AggregationType};
use crate::value::{Entity, FieldValue, Record, ValueKey, ValueKind};

/// Computes aggregate values
pub struct Aggregator;

impl Aggregator {
    /// Number of entities
    pub fn count<E: Entity>(data: &[E]) -> usize {
        data.len()
    }

    /// Number of distinct present, non-null values of `field`
    pub fn count_distinct<E: Entity>(data: &[E], field: &str) -> usize {
        Self::present_values(data, field)
            .map(ValueKey::new)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Sum of the numeric values of `field`; 0 when there are none
    pub fn sum<E: Entity>(data: &[E], field: &str) -> LayerResult<f64> {
        Self::ensure_numeric(data, field)?;
        Ok(Self::numbers(data, field).sum())
    }

    /// Mean of the numeric values of `field`; `None` when there are none
    pub fn avg<E: Entity>(data: &[E], field: &str) -> LayerResult<Option<f64>> {
        Self::ensure_numeric(data, field)?;

        let (total, count) = Self::numbers(data, field)
            .fold((0.0, 0usize), |(total, count), n| (total + n, count + 1));
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(total / count as f64))
    }

    /// Smallest present, non-null value of `field`
    pub fn min<E: Entity>(data: &[E], field: &str) -> Option<FieldValue> {
        Self::present_values(data, field)
            .filter(|v| !Self::is_nan(v))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Largest present, non-null value of `field`
    pub fn max<E: Entity>(data: &[E], field: &str) -> Option<FieldValue> {
        Self::present_values(data, field)
            .filter(|v| !Self::is_nan(v))
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Computes one aggregation
    pub fn compute<E: Entity>(data: &[E], aggregation: &Aggregation) -> LayerResult<FieldValue> {
        if aggregation.kind == AggregationType::Count {
            return Ok(FieldValue::from(Self::count(data)));
        }

        let field = aggregation.field.as_deref().ok_or_else(|| {
            QueryError::invalid_field(
                aggregation.alias.as_str(),
                format!("Aggregation '{}' requires a field", aggregation.kind.as_str()),
            )
        })?;

        let value = match aggregation.kind {
            AggregationType::Count => FieldValue::from(Self::count(data)),
            AggregationType::CountDistinct => FieldValue::from(Self::count_distinct(data, field)),
            AggregationType::Sum => FieldValue::from(Self::sum(data, field)?),
            AggregationType::Avg => FieldValue::from(Self::avg(data, field)?),
            AggregationType::Min => FieldValue::from(Self::min(data, field)),
            AggregationType::Max => FieldValue::from(Self::max(data, field)),
        };
        Ok(value)
    }

    /// Runs every aggregation, keyed by alias
    pub fn apply_aggregations<E: Entity>(
        data: &[E],
        aggregations: &[Aggregation],
    ) -> LayerResult<Record> {
        let mut row = Record::new();
        for aggregation in aggregations {
            row.insert(aggregation.alias.clone(), Self::compute(data, aggregation)?);
        }
        Ok(row)
    }

    /// Fails unless every present, non-null value of `field` is a number
    fn ensure_numeric<E: Entity>(data: &[E], field: &str) -> LayerResult<()> {
        match Self::present_values(data, field).find(|v| v.kind() != ValueKind::Number) {
            Some(found) => Err(QueryError::type_mismatch(field, "number", found.kind().as_str())),
            None => Ok(()),
        }
    }

    fn present_values<'a, E: Entity>(
        data: &'a [E],
        field: &'a str,
    ) -> impl Iterator<Item = FieldValue> + 'a {
        data.iter()
            .filter_map(move |entity| entity.field(field))
            .filter(|v| !v.is_null())
    }

    fn numbers<'a, E: Entity>(data: &'a [E], field: &'a str) -> impl Iterator<Item = f64> + 'a {
        Self::present_values(data, field)
            .filter_map(|v| v.as_f64())
            .filter(|n| !n.is_nan())
    }

    fn is_nan(value: &FieldValue) -> bool {
        value.as_f64().is_some_and(f64::is_nan)
    }
}
