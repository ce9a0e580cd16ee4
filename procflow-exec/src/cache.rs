use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use procflow_core::types::{ProcessInstance, StepInstance};
use procflow_core::Failure;
use procflow_store::{Collection, DocumentStore, StoreError, WriteBatch};

/// An instance record persisted as one document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn key(&self) -> &str;
}

impl Document for ProcessInstance {
    const COLLECTION: Collection = Collection::ProcessInstances;

    fn key(&self) -> &str {
        &self.instance_key
    }
}

impl Document for StepInstance {
    const COLLECTION: Collection = Collection::StepInstances;

    fn key(&self) -> &str {
        &self.instance_key
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("{collection} has no document '{key}'")]
    NotFound { collection: Collection, key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("document '{key}' could not be decoded: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<CacheError> for Failure {
    fn from(e: CacheError) -> Self {
        match &e {
            CacheError::NotFound { key, .. } => Failure::instance_not_found(key),
            CacheError::Codec { key, .. } => Failure::store(e.to_string()).with_instance(key.clone()),
            CacheError::Store(_) => Failure::store(e.to_string()),
        }
    }
}

/// Read-through cache of instance documents. The store stays the system of
/// record: the first access to a key always loads it from there, and entries
/// are only refreshed by [`InstanceCache::add`] after a successful commit.
pub struct InstanceCache<T> {
    store: Arc<dyn DocumentStore>,
    entries: DashMap<String, T>,
}

impl<T: Document> InstanceCache<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            entries: DashMap::new(),
        }
    }

    /// A copy of the instance, loading it from the store on a miss.
    pub async fn get(&self, key: &str) -> Result<T, CacheError> {
        let cached = self.entries.get(key).map(|e| e.value().clone());
        if let Some(doc) = cached {
            return Ok(doc);
        }

        let value = self
            .store
            .get(T::COLLECTION, key)
            .await?
            .ok_or_else(|| CacheError::NotFound {
                collection: T::COLLECTION,
                key: key.to_string(),
            })?;
        let doc: T = serde_json::from_value(value).map_err(|source| CacheError::Codec {
            key: key.to_string(),
            source,
        })?;
        let collection = T::COLLECTION;
        debug!(collection = %collection, key, "loaded instance into cache");
        self.entries.insert(key.to_string(), doc.clone());
        Ok(doc)
    }

    /// Memoize without writing to the store.
    pub fn add(&self, doc: T) {
        self.entries.insert(doc.key().to_string(), doc);
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Stage `doc` into `batch`; the cache itself is left untouched.
    pub fn stage_write(&self, batch: &mut WriteBatch, doc: &T) -> Result<(), StoreError> {
        batch.stage(T::COLLECTION, doc.key(), doc)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
