mod support;

use serde_json::json;

use procflow_core::types::{ProcessStatus, StepStatus};
use procflow_core::SpecId;
use procflow_store::Collection;

use support::{complete, engine, only_step, record, steps_named, SCENARIO};

#[tokio::test]
async fn create_then_submit_scenario() {
    let (engine, _store) = engine(SCENARIO);

    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();

    let process = engine.process_instance(&key).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Runnable);
    let s1 = only_step(&engine, &key, "S1").await;
    assert_eq!(s1.status, StepStatus::Ready);
    assert!(steps_named(&engine, &key, "S2").await.is_empty());

    complete(&engine, &s1.instance_key, json!({ "x": 1 })).await;

    let s2 = only_step(&engine, &key, "S2").await;
    assert_eq!(s2.status, StepStatus::Ready);
    assert_eq!(s2.predecessors_completed.get("S1"), Some(&true));
    let process = engine.process_instance(&key).await.unwrap();
    assert_eq!(process.data, record(json!({ "x": 1 })));
    assert_eq!(only_step(&engine, &key, "S1").await.status, StepStatus::Success);
    assert_eq!(process.open_steps.len(), 1);
}

#[tokio::test]
async fn last_submission_completes_process() {
    let (engine, _store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::new("P", 1), record(json!({})))
        .await
        .unwrap();

    let s1 = only_step(&engine, &key, "S1").await;
    complete(&engine, &s1.instance_key, json!({ "x": 1 })).await;
    let s2 = only_step(&engine, &key, "S2").await;
    complete(&engine, &s2.instance_key, json!({ "y": "done" })).await;

    let process = engine.process_instance(&key).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Completed);
    assert!(process.admin_data.stop_time.is_some());
    assert_eq!(process.data, record(json!({ "x": 1, "y": "done" })));
    assert!(process.log_items.iter().any(|l| l.message.contains("COMPLETED")));
}

#[tokio::test]
async fn submit_persists_process_and_new_steps_in_one_batch() {
    let (engine, store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await;

    let create_batch = &store.batches()[0];
    assert_eq!(create_batch.keys(Collection::ProcessInstances).collect::<Vec<_>>(), vec![key.as_str()]);
    assert_eq!(
        create_batch.keys(Collection::StepInstances).collect::<Vec<_>>(),
        vec![s1.instance_key.as_str()]
    );

    complete(&engine, &s1.instance_key, json!({ "x": 1 })).await;
    let s2 = only_step(&engine, &key, "S2").await;

    let submit_batch = store.batches().last().cloned().unwrap();
    assert_eq!(submit_batch.keys(Collection::ProcessInstances).count(), 1);
    let step_keys: Vec<&str> = submit_batch.keys(Collection::StepInstances).collect();
    assert!(step_keys.contains(&s1.instance_key.as_str()));
    assert!(step_keys.contains(&s2.instance_key.as_str()));
}

#[tokio::test]
async fn failed_commit_leaves_no_trace() {
    let (engine, store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await;
    engine.select_step(&s1.instance_key).await.unwrap();

    store.fail_commits(true);
    let failures = engine
        .submit_step(&s1.instance_key, record(json!({ "x": 1 })))
        .await
        .unwrap_err();
    assert_eq!(failures[0].kind, procflow_core::FailureKind::Store);

    let process = engine.process_instance(&key).await.unwrap();
    assert!(process.data.is_empty());
    assert_eq!(engine.step_instance(&s1.instance_key).await.unwrap().status, StepStatus::Ready);

    store.fail_commits(false);
    engine
        .submit_step(&s1.instance_key, record(json!({ "x": 1 })))
        .await
        .unwrap();
    assert_eq!(only_step(&engine, &key, "S2").await.status, StepStatus::Ready);
}

#[tokio::test]
async fn fresh_engine_reads_state_back_from_store() {
    let (engine, store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await;

    let reopened = procflow_exec::Engine::new(
        store.clone(),
        support::registry(SCENARIO),
        std::sync::Arc::new(procflow_exec::StaticIdentity::new(procflow_exec::Actor::new("alice"))),
    );
    complete(&reopened, &s1.instance_key, json!({ "x": 2 })).await;
    assert_eq!(
        reopened.process_instance(&key).await.unwrap().data,
        record(json!({ "x": 2 }))
    );
}

#[tokio::test]
async fn events_follow_commits() {
    let (engine, _store) = engine(SCENARIO);
    let sink = std::sync::Arc::new(procflow_exec::RecordingEventSink::new());
    let engine = engine.with_events(sink.clone());

    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();

    let events = sink.events();
    assert!(matches!(
        &events[0],
        procflow_exec::EngineEvent::ProcessCreated { process_key, .. } if *process_key == key
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        procflow_exec::EngineEvent::StepChanged { step, status: StepStatus::Ready, .. } if step == "S1"
    )));
}
