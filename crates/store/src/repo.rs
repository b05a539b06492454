//! Generic entity repository.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Result, StoreError};

/// Keyed entity storage.
///
/// A `Repo` is an explicit, injected state container: construct one per
/// process (or per test case) and hand a clone of the handle to every
/// service that needs it. Entities are stored whole; callers load, mutate
/// a copy, and save it back, so a failed operation never leaves a partial
/// write behind.
#[async_trait]
pub trait Repo<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Inserts a new entity. Fails with [`StoreError::Duplicate`] if the
    /// key is already present (unique constraint simulation).
    async fn insert(&self, key: K, value: V) -> Result<()>;

    /// Loads an entity by key.
    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Replaces an existing entity. Fails with [`StoreError::NotFound`]
    /// if the key is absent.
    async fn save(&self, key: K, value: V) -> Result<()>;

    /// Returns all stored entities.
    async fn all(&self) -> Result<Vec<V>>;
}

/// In-memory repository implementation.
///
/// Provides the same interface a durable implementation would, backed by a
/// `HashMap` behind an async `RwLock`. `Clone` shares the underlying map.
#[derive(Debug, Default)]
pub struct InMemoryRepo<K, V> {
    entities: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for InMemoryRepo<K, V> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
        }
    }
}

impl<K, V> InMemoryRepo<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored entities.
    pub async fn count(&self) -> usize {
        self.entities.read().await.len()
    }
}

#[async_trait]
impl<K, V> Repo<K, V> for InMemoryRepo<K, V>
where
    K: Eq + Hash + std::fmt::Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn insert(&self, key: K, value: V) -> Result<()> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("{key:?}")));
        }
        entities.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.entities.read().await.get(key).cloned())
    }

    async fn save(&self, key: K, value: V) -> Result<()> {
        let mut entities = self.entities.write().await;
        if !entities.contains_key(&key) {
            return Err(StoreError::NotFound(format!("{key:?}")));
        }
        entities.insert(key, value);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<V>> {
        Ok(self.entities.read().await.values().cloned().collect())
    }
}
