#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use procflow_core::types::{Record, StepInstance};
use procflow_core::{parse_document_str, DocumentFormat, SpecRegistry};
use procflow_exec::{Actor, Engine, StaticIdentity};
use procflow_store::{Collection, DocumentStore, MemoryStore, StoreError, WriteBatch};

/// Wraps a [`MemoryStore`], keeping a copy of every committed batch and
/// optionally refusing commits.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    batches: Mutex<Vec<WriteBatch>>,
    fail_commits: AtomicBool,
    attempts: AtomicUsize,
    fail_attempt: AtomicUsize,
}

impl RecordingStore {
    pub fn batches(&self) -> Vec<WriteBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn commits(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Refuse only the `n`th commit attempt from now on (1 = the next one).
    pub fn fail_nth_commit(&self, n: usize) {
        let base = self.attempts.load(Ordering::SeqCst);
        self.fail_attempt.store(base + n, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<JsonValue>, StoreError> {
        self.inner.get(collection, key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, JsonValue)>, StoreError> {
        self.inner.list(collection).await
    }

    async fn list_process_steps(&self, process_key: &str) -> Result<Vec<(String, JsonValue)>, StoreError> {
        self.inner.list_process_steps(process_key).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_commits.load(Ordering::SeqCst)
            || attempt == self.fail_attempt.load(Ordering::SeqCst)
        {
            return Err(StoreError::Other("commit refused".into()));
        }
        self.batches.lock().unwrap().push(batch.clone());
        self.inner.commit(batch).await
    }
}

pub fn registry(yaml: &str) -> Arc<SpecRegistry> {
    let doc = parse_document_str(yaml, DocumentFormat::Yaml).unwrap().document;
    let registry = SpecRegistry::default();
    registry.register_document(doc).unwrap();
    Arc::new(registry)
}

pub fn engine(yaml: &str) -> (Engine, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::default());
    let identity = Arc::new(StaticIdentity::new(Actor::new("alice")));
    (Engine::new(store.clone(), registry(yaml), identity), store)
}

pub fn as_actor(engine: &Engine, id: &str) -> Engine {
    engine.with_identity(Arc::new(StaticIdentity::new(Actor::new(id))))
}

pub fn record(value: JsonValue) -> Record {
    value.as_object().cloned().unwrap()
}

pub async fn steps_named(engine: &Engine, process_key: &str, name: &str) -> Vec<StepInstance> {
    engine
        .process_view(process_key)
        .await
        .unwrap()
        .steps
        .into_iter()
        .filter(|s| s.name() == name)
        .collect()
}

pub async fn only_step(engine: &Engine, process_key: &str, name: &str) -> StepInstance {
    let mut steps = steps_named(engine, process_key, name).await;
    assert_eq!(steps.len(), 1, "expected exactly one '{name}' instance");
    steps.remove(0)
}

/// Select and submit an input step as the engine's own actor.
pub async fn complete(engine: &Engine, step_key: &str, data: JsonValue) {
    engine.select_step(step_key).await.unwrap();
    engine.submit_step(step_key, record(data)).await.unwrap();
}

pub const SCENARIO: &str = r#"
processes:
  - specId: P@1
    initialSteps: [S1]
steps:
  - kind: input
    specId: S1@1
    successorSteps: [S2]
    inputFieldNames: [x]
  - kind: input
    specId: S2@1
    predecessorSteps: [S1]
    inputFieldNames: [y]
"#;
