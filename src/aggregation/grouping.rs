//! Grouping by a composite key
//!
//! A group key is the ordered tuple of the group fields' values, so decoding
//! a key back into row values is structural. Absent fields group with null.
//! Groups are returned in first-seen order.

use std::collections::HashMap;

use crate::errors::LayerResult;
use crate::query::Aggregation;
use crate::value::{Entity, FieldValue, Record, ValueKey};

use super::functions::Aggregator;

/// Ordered tuple of group-field values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<ValueKey>);

impl GroupKey {
    /// Builds the key of `entity` over `fields`
    pub fn of<E: Entity, S: AsRef<str>>(entity: &E, fields: &[S]) -> Self {
        GroupKey(
            fields
                .iter()
                .map(|f| ValueKey::new(entity.field(f.as_ref()).unwrap_or(FieldValue::Null)))
                .collect(),
        )
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.0.iter().map(ValueKey::value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs each group field with its key value
    pub fn to_record<S: AsRef<str>>(&self, fields: &[S]) -> Record {
        fields
            .iter()
            .zip(self.values())
            .map(|(f, v)| (f.as_ref().to_string(), v.clone()))
            .collect()
    }
}

/// Entities sharing one group key
#[derive(Debug, Clone)]
pub struct Group<E> {
    pub key: GroupKey,
    pub entities: Vec<E>,
}

impl<E> Group<E> {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Aggregator {
    /// Buckets entities by their values of `fields`
    pub fn group_by<E, I, S>(data: I, fields: &[S]) -> Vec<Group<E>>
    where
        E: Entity,
        I: IntoIterator<Item = E>,
        S: AsRef<str>,
    {
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<Group<E>> = Vec::new();

        for entity in data {
            let key = GroupKey::of(&entity, fields);
            match index.get(&key) {
                Some(&slot) => groups[slot].entities.push(entity),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        entities: vec![entity],
                    });
                }
            }
        }

        groups
    }

    /// One row per group: the group field values followed by each
    /// aggregation under its alias
    pub fn apply_aggregations_to_groups<E: Entity, S: AsRef<str>>(
        groups: &[Group<E>],
        group_fields: &[S],
        aggregations: &[Aggregation],
    ) -> LayerResult<Vec<Record>> {
        groups
            .iter()
            .map(|group| {
                let mut row = group.key.to_record(group_fields);
                row.extend(Self::apply_aggregations(&group.entities, aggregations)?);
                Ok(row)
            })
            .collect()
    }
}
