//! Plain in-memory adapter

use std::sync::RwLock;

use futures_util::stream::{self, StreamExt};

use crate::value::Entity;

use super::adapter::{AdapterDescriptor, EntityStream, StorageAdapter};

/// Adapter over a vector of entities.
///
/// Declares itself plain, so every query runs through the fallback path.
#[derive(Debug, Default)]
pub struct InMemoryAdapter<T> {
    entities: RwLock<Vec<T>>,
}

impl<T: Entity> InMemoryAdapter<T> {
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities: RwLock::new(entities),
        }
    }

    // A poisoned lock still holds a usable vector
    pub fn insert(&self, entity: T) {
        let mut guard = self.entities.write().unwrap_or_else(|e| e.into_inner());
        guard.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Entity + 'static> StorageAdapter<T> for InMemoryAdapter<T> {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::Plain
    }

    fn values(&self) -> EntityStream<'_, T> {
        let snapshot: Vec<T> = self
            .entities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }
}
