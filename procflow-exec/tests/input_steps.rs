mod support;

use std::sync::Arc;

use serde_json::json;

use procflow_core::types::{StepInstanceKind, StepStatus};
use procflow_core::{FailureKind, SpecId};
use procflow_exec::EngineConfig;

use support::{as_actor, engine, only_step, record, SCENARIO};

async fn started(yaml: &str) -> (procflow_exec::Engine, Arc<support::RecordingStore>, String, String) {
    let (engine, store) = engine(yaml);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await.instance_key;
    (engine, store, key, s1)
}

#[tokio::test]
async fn select_records_actor_and_rejects_second_select() {
    let (engine, _store, _key, s1) = started(SCENARIO).await;
    engine.select_step(&s1).await.unwrap();
    assert_eq!(engine.step_instance(&s1).await.unwrap().active_actor(), Some("alice"));

    let failures = as_actor(&engine, "bob").select_step(&s1).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::StepAlreadyActive);
    assert_eq!(failures[0].instance_key.as_deref(), Some(s1.as_str()));
}

#[tokio::test]
async fn return_and_submit_need_an_active_actor() {
    let (engine, _store, _key, s1) = started(SCENARIO).await;

    let failures = engine.return_step(&s1).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::StepNotActive);

    let failures = engine.submit_step(&s1, record(json!({ "x": 1 }))).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::StepNotActive);

    let failures = engine.save_step(&s1, record(json!({ "x": 1 }))).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::StepNotActive);
}

#[tokio::test]
async fn only_the_holder_may_return_or_submit() {
    let (engine, _store, _key, s1) = started(SCENARIO).await;
    engine.select_step(&s1).await.unwrap();
    let bob = as_actor(&engine, "bob");

    let failures = bob.submit_step(&s1, record(json!({ "x": 1 }))).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::AccessDenied);
    let failures = bob.return_step(&s1).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::AccessDenied);

    engine.return_step(&s1).await.unwrap();
    assert_eq!(engine.step_instance(&s1).await.unwrap().active_actor(), None);
    bob.select_step(&s1).await.unwrap();
    bob.submit_step(&s1, record(json!({ "x": 1 }))).await.unwrap();
}

#[tokio::test]
async fn completed_step_is_not_ready() {
    let (engine, _store, _key, s1) = started(SCENARIO).await;
    engine.select_step(&s1).await.unwrap();
    engine.submit_step(&s1, record(json!({ "x": 1 }))).await.unwrap();

    let failures = engine.submit_step(&s1, record(json!({ "x": 2 }))).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::StepNotReady);
}

#[tokio::test]
async fn save_keeps_a_draft_until_submit() {
    let (engine, store, key, s1) = started(SCENARIO).await;
    engine.select_step(&s1).await.unwrap();

    let commits = store.commits();
    engine.save_step(&s1, record(json!({ "x": "draft" }))).await.unwrap();
    let batch = store.batches().last().cloned().unwrap();
    assert_eq!(store.commits(), commits + 1);
    assert_eq!(batch.len(), 1);

    let step = engine.step_instance(&s1).await.unwrap();
    let StepInstanceKind::Input { temporary_data, .. } = &step.kind else {
        panic!("S1 is an input step");
    };
    assert_eq!(temporary_data, &record(json!({ "x": "draft" })));
    assert!(engine.process_instance(&key).await.unwrap().data.is_empty());

    let failures = as_actor(&engine, "bob")
        .save_step(&s1, record(json!({ "x": "mine" })))
        .await
        .unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::AccessDenied);

    engine.submit_step(&s1, record(json!({ "x": 1 }))).await.unwrap();
    let step = engine.step_instance(&s1).await.unwrap();
    let StepInstanceKind::Input { temporary_data, .. } = &step.kind else {
        panic!("S1 is an input step");
    };
    assert!(temporary_data.is_empty());
}

#[tokio::test]
async fn fields_outside_the_step_are_not_merged() {
    let (engine, _store, key, s1) = started(SCENARIO).await;
    engine.select_step(&s1).await.unwrap();
    engine
        .submit_step(&s1, record(json!({ "x": 1, "y": "sneaky" })))
        .await
        .unwrap();
    assert_eq!(
        engine.process_instance(&key).await.unwrap().data,
        record(json!({ "x": 1 }))
    );
}

#[tokio::test]
async fn system_steps_cannot_be_selected() {
    let yaml = r#"
processes:
  - specId: P@1
    initialSteps: [auto]
steps:
  - kind: system
    specId: auto@1
    action: { type: expression, expression: "EQ(1, 1)" }
"#;
    let (engine, _store) = engine(yaml);
    let engine = engine.with_config(EngineConfig {
        max_system_steps_per_run: 0,
        ..EngineConfig::default()
    });
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let auto = only_step(&engine, &key, "auto").await;
    assert_eq!(auto.status, StepStatus::ExecuteReady);

    let failures = engine.select_step(&auto.instance_key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::SpecKindMismatch);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_selects_have_one_winner() {
    for _ in 0..20 {
        let (engine, _store, _key, s1) = started(SCENARIO).await;
        let handles: Vec<_> = ["ann", "bob"]
            .into_iter()
            .map(|who| {
                let engine = as_actor(&engine, who);
                let s1 = s1.clone();
                tokio::spawn(async move { engine.select_step(&s1).await })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => wins += 1,
                Err(f) => {
                    assert_eq!(f[0].kind, FailureKind::StepAlreadyActive);
                    conflicts += 1;
                }
            }
        }
        assert_eq!((wins, conflicts), (1, 1));
    }
}
