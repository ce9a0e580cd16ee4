use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Transaction};

use crate::store::{StoreError, Write};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub key: String,
    pub body: JsonValue,
}

pub async fn get_document(
    pool: &PgPool,
    collection: &str,
    key: &str,
) -> Result<Option<JsonValue>, StoreError> {
    let rec = sqlx::query_as::<_, DocumentRow>(
        r#"SELECT key, body FROM documents WHERE collection = $1 AND key = $2"#,
    )
    .bind(collection)
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(rec.map(|r| r.body))
}

pub async fn list_documents(pool: &PgPool, collection: &str) -> Result<Vec<DocumentRow>, StoreError> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        r#"SELECT key, body FROM documents WHERE collection = $1 ORDER BY key"#,
    )
    .bind(collection)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Served by `documents_process_key_idx`, whose predicate pins the collection.
pub async fn list_process_steps(pool: &PgPool, process_key: &str) -> Result<Vec<DocumentRow>, StoreError> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        r#"
SELECT key, body FROM documents
WHERE collection = 'step_instances' AND body ->> 'processInstanceKey' = $1
ORDER BY key
        "#,
    )
    .bind(process_key)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn upsert_document(
    tx: &mut Transaction<'_, Postgres>,
    write: &Write,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
INSERT INTO documents (collection, key, body)
VALUES ($1, $2, $3)
ON CONFLICT (collection, key) DO UPDATE
SET body = EXCLUDED.body, updated_at = now()
        "#,
    )
    .bind(write.collection.as_str())
    .bind(&write.key)
    .bind(&write.value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
