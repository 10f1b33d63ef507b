//! Multi-key result sorting
//!
//! Keys are compared most significant first using the total value order.
//! Absent fields read as null. Without an explicit placement nulls sort
//! lowest, so they lead ascending keys and trail descending ones.

use std::cmp::Ordering;

use crate::query::{NullsOrder, OrderBy, SortDirection};
use crate::value::{Entity, FieldValue};

/// Sorts entities by ordering keys
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts `data` by `ordering`.
    ///
    /// Sort is stable: entities with equal keys keep their input order.
    pub fn sort<E: Entity>(data: Vec<E>, ordering: &[OrderBy]) -> Vec<E> {
        if ordering.is_empty() || data.len() < 2 {
            return data;
        }

        let mut keyed: Vec<(Vec<FieldValue>, E)> = data
            .into_iter()
            .map(|entity| {
                let keys = ordering
                    .iter()
                    .map(|o| entity.field(&o.field).unwrap_or(FieldValue::Null))
                    .collect();
                (keys, entity)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| Self::compare_keys(a, b, ordering));
        keyed.into_iter().map(|(_, entity)| entity).collect()
    }

    fn compare_keys(a: &[FieldValue], b: &[FieldValue], ordering: &[OrderBy]) -> Ordering {
        for ((x, y), order) in a.iter().zip(b.iter()).zip(ordering) {
            let result = Self::compare_values(x, y, order);
            if result != Ordering::Equal {
                return result;
            }
        }
        Ordering::Equal
    }

    /// Compares two key values under one ordering key.
    ///
    /// Explicit null placement is independent of direction.
    fn compare_values(a: &FieldValue, b: &FieldValue, order: &OrderBy) -> Ordering {
        match (a.is_null(), b.is_null(), order.nulls) {
            (true, true, _) => return Ordering::Equal,
            (true, false, Some(NullsOrder::First)) | (false, true, Some(NullsOrder::Last)) => {
                return Ordering::Less
            }
            (true, false, Some(NullsOrder::Last)) | (false, true, Some(NullsOrder::First)) => {
                return Ordering::Greater
            }
            _ => {}
        }

        let ordering = a.total_cmp(b);
        match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn ids(data: &[Value]) -> Vec<&str> {
        data.iter().map(|d| d["id"].as_str().unwrap()).collect()
    }

    fn people() -> Vec<Value> {
        vec![
            json!({"id": "c", "age": 30, "team": "x"}),
            json!({"id": "a", "age": 20, "team": "y"}),
            json!({"id": "n", "team": "x"}),
            json!({"id": "b", "age": 25, "team": "x"}),
        ]
    }

    #[test]
    fn test_sort_ascending_nulls_lowest() {
        let sorted = ResultSorter::sort(people(), &[OrderBy::asc("age")]);
        assert_eq!(ids(&sorted), vec!["n", "a", "b", "c"]);
    }

    #[test]
    fn test_sort_descending_nulls_trail() {
        let sorted = ResultSorter::sort(people(), &[OrderBy::desc("age")]);
        assert_eq!(ids(&sorted), vec!["c", "b", "a", "n"]);
    }

    #[test]
    fn test_explicit_null_placement() {
        let sorted = ResultSorter::sort(people(), &[OrderBy::asc("age").nulls_last()]);
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "n"]);

        let sorted = ResultSorter::sort(people(), &[OrderBy::desc("age").nulls_first()]);
        assert_eq!(ids(&sorted), vec!["n", "c", "b", "a"]);
    }

    #[test]
    fn test_multi_key() {
        let sorted = ResultSorter::sort(
            people(),
            &[OrderBy::asc("team"), OrderBy::desc("age").nulls_first()],
        );
        assert_eq!(ids(&sorted), vec!["n", "c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        let data = vec![
            json!({"id": "a", "v": 1}),
            json!({"id": "b", "v": 1}),
            json!({"id": "c", "v": 1}),
        ];
        let sorted = ResultSorter::sort(data, &[OrderBy::asc("v")]);
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }
}
