mod support;

use serde_json::json;

use procflow_core::types::{ProcessStatus, StepStatus};
use procflow_core::{FailureKind, SpecId};

use support::{engine, only_step, record, SCENARIO};

#[tokio::test]
async fn suspended_process_rejects_step_actions() {
    let (engine, _store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await;

    engine.suspend_process(&key).await.unwrap();
    let failures = engine.select_step(&s1.instance_key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::ProcessNotRunnable);

    let failures = engine.suspend_process(&key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::ProcessNotRunnable);

    engine.resume_process(&key).await.unwrap();
    engine.select_step(&s1.instance_key).await.unwrap();
}

#[tokio::test]
async fn terminate_closes_every_open_step() {
    let (engine, store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let s1 = only_step(&engine, &key, "S1").await;
    let commits = store.commits();

    engine.terminate_process(&key).await.unwrap();
    assert_eq!(store.commits(), commits + 1);

    let process = engine.process_instance(&key).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Terminated);
    assert!(process.admin_data.stop_time.is_some());
    assert!(process.open_steps.is_empty());
    assert_eq!(
        engine.step_instance(&s1.instance_key).await.unwrap().status,
        StepStatus::Terminated
    );

    let failures = engine.resume_process(&key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::ProcessNotRunnable);
    let failures = engine.terminate_process(&key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::ProcessNotRunnable);
}

#[tokio::test]
async fn unknown_process_is_not_found() {
    let (engine, _store) = engine(SCENARIO);
    let failures = engine.suspend_process("nope").await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::InstanceNotFound);
}

#[tokio::test]
async fn view_lists_only_the_process_steps() {
    let (engine, _store) = engine(SCENARIO);
    let first = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();
    let second = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();

    let view = engine.process_view(&first).await.unwrap();
    assert_eq!(view.process.instance_key, first);
    assert_eq!(view.steps.len(), 1);
    assert!(view.steps.iter().all(|s| s.process_instance_key == first));

    let other = engine.process_view(&second).await.unwrap();
    assert_ne!(other.steps[0].instance_key, view.steps[0].instance_key);
}

#[tokio::test]
async fn locks_are_released_with_finished_processes() {
    let (engine, _store) = engine(SCENARIO);
    for _ in 0..50 {
        let key = engine
            .create_process(&SpecId::latest("P"), record(json!({})))
            .await
            .unwrap();
        engine.terminate_process(&key).await.unwrap();
    }
    assert_eq!(engine.locked_processes(), 0);
}

#[tokio::test]
async fn ready_system_steps_need_a_runnable_process() {
    let (engine, _store) = engine(SCENARIO);
    let key = engine
        .create_process(&SpecId::latest("P"), record(json!({})))
        .await
        .unwrap();

    // nothing is ready, so this is a no-op
    engine.run_ready_system_steps(&key).await.unwrap();

    engine.suspend_process(&key).await.unwrap();
    let failures = engine.run_ready_system_steps(&key).await.unwrap_err();
    assert_eq!(failures[0].kind, FailureKind::ProcessNotRunnable);
}
