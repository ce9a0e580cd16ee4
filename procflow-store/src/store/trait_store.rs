use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{Collection, WriteBatch};

/// Keyed JSON document persistence with atomic multi-document commits.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<JsonValue>, StoreError>;

    /// Every document of a collection as `(key, body)`, ordered by key.
    async fn list(&self, collection: Collection) -> Result<Vec<(String, JsonValue)>, StoreError>;

    /// Step instance documents whose `processInstanceKey` is `process_key`,
    /// ordered by key.
    async fn list_process_steps(&self, process_key: &str) -> Result<Vec<(String, JsonValue)>, StoreError>;

    /// Apply all writes of the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Other(String),
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}
