use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::debug;

use crate::store::{Collection, DocumentStore, StoreError, WriteBatch};

use super::documents;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<JsonValue>, StoreError> {
        documents::get_document(&self.pool, collection.as_str(), key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, JsonValue)>, StoreError> {
        let rows = documents::list_documents(&self.pool, collection.as_str()).await?;
        Ok(rows.into_iter().map(|r| (r.key, r.body)).collect())
    }

    async fn list_process_steps(&self, process_key: &str) -> Result<Vec<(String, JsonValue)>, StoreError> {
        let rows = documents::list_process_steps(&self.pool, process_key).await?;
        Ok(rows.into_iter().map(|r| (r.key, r.body)).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for write in batch.writes() {
            documents::upsert_document(&mut tx, write).await?;
        }
        tx.commit().await?;
        debug!(writes = batch.len(), "committed batch");
        Ok(())
    }
}
