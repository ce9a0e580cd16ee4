use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{Collection, DocumentStore, StoreError, WriteBatch};

/// A process-local document store. Commits apply under a single write lock,
/// so readers never observe half of a batch.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<(Collection, String), JsonValue>>,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<JsonValue>, StoreError> {
        let docs = self.documents.read().await;
        Ok(docs.get(&(collection, key.to_string())).cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, JsonValue)>, StoreError> {
        let docs = self.documents.read().await;
        Ok(docs
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn list_process_steps(&self, process_key: &str) -> Result<Vec<(String, JsonValue)>, StoreError> {
        let docs = self.documents.read().await;
        Ok(docs
            .iter()
            .filter(|((c, _), v)| {
                *c == Collection::StepInstances
                    && v.get("processInstanceKey").and_then(JsonValue::as_str) == Some(process_key)
            })
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut docs = self.documents.write().await;
        let n = batch.len();
        for w in batch.into_writes() {
            docs.insert((w.collection, w.key), w.value);
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        debug!(writes = n, "committed batch");
        Ok(())
    }
}
