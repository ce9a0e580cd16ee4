use std::sync::Arc;

use procflow_store::{Collection, DocumentStore, MemoryStore, WriteBatch};
use serde_json::json;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Doc {
    instance_key: String,
    count: u32,
}

#[test]
fn stage_serializes_documents() {
    let mut batch = WriteBatch::new();
    batch
        .stage(Collection::StepInstances, "s1", &Doc { instance_key: "s1".into(), count: 2 })
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.writes()[0].value, json!({ "instanceKey": "s1", "count": 2 }));
    assert_eq!(batch.keys(Collection::StepInstances).collect::<Vec<_>>(), vec!["s1"]);
    assert_eq!(batch.keys(Collection::ProcessInstances).count(), 0);
}

#[tokio::test]
async fn readers_see_whole_batches() {
    let store = Arc::new(MemoryStore::new());

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..50u32 {
                let mut batch = WriteBatch::new();
                batch.stage_write(Collection::ProcessInstances, "p", json!({ "n": i }));
                batch.stage_write(Collection::StepInstances, "s", json!({ "n": i }));
                store.commit(batch).await.unwrap();
            }
        })
    };

    for _ in 0..50 {
        let p = store.get(Collection::ProcessInstances, "p").await.unwrap();
        let s = store.get(Collection::StepInstances, "s").await.unwrap();
        if let (Some(p), Some(s)) = (p, s) {
            assert!(p["n"].as_u64() <= s["n"].as_u64());
        }
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
    assert_eq!(store.commit_count(), 50);
}
