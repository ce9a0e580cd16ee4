mod support;

use std::sync::Arc;

use serde_json::json;

use procflow_core::types::StepStatus;
use procflow_core::{FailureKind, SpecId};
use procflow_exec::{Actor, StaticIdentity};

use support::{as_actor, engine, only_step, record};

const SPECS: &str = r#"
processes:
  - specId: person@1
    dataFieldSpecs:
      - name: name
        type: text
        required: true
        validation: "GT(LENGTH(FIELD(name)), 0)"
      - name: age
        type: number
    initialSteps: [intake]
  - specId: { name: retired, version: 1, active: false }
    dataFieldSpecs:
      - { name: name, type: text, required: true }
    initialSteps: [intake]
  - specId: broken@1
    dataFieldSpecs:
      - { name: name, type: text, required: true }
      - { name: age, type: number }
    initialSteps: [intake, ghost, old]
  - specId: guarded@1
    initialSteps: [picky, fussy]
  - specId: nobody@1
    initialSteps: [never]
steps:
  - kind: input
    specId: intake@1
    successorSteps: [review]
    inputFieldNames: [name, age]
  - kind: input
    specId: review@1
    predecessorSteps: [intake]
    guardExpression: "GT(ADD(FIELD(age), 1), 0)"
  - kind: input
    specId: { name: old, version: 1, active: false }
  - kind: input
    specId: picky@1
    guardExpression: "GT(ADD(FIELD(missing), 1), 0)"
  - kind: input
    specId: fussy@1
    guardExpression: "NOPE(1)"
  - kind: input
    specId: never@1
    guardExpression: "EQ(1, 2)"
"#;

fn kinds(failures: &[procflow_core::Failure]) -> Vec<FailureKind> {
    failures.iter().map(|f| f.kind).collect()
}

#[tokio::test]
async fn missing_actor_is_reported_before_anything_else() {
    let (engine, store) = engine(SPECS);
    let anonymous = engine.with_identity(Arc::new(StaticIdentity::anonymous()));
    let failures = anonymous
        .create_process(&SpecId::latest("does-not-exist"), record(json!({})))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::AccessDenied]);
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn access_is_checked_before_existence() {
    let (engine, _store) = engine(SPECS);
    let restricted = engine.with_identity(Arc::new(
        StaticIdentity::new(Actor::new("bob")).allow_only(["person"]),
    ));
    let failures = restricted
        .create_process(&SpecId::latest("does-not-exist"), record(json!({})))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::AccessDenied]);
    assert_eq!(failures[0].spec_id, Some(SpecId::latest("does-not-exist")));
}

#[tokio::test]
async fn unknown_spec_is_not_found() {
    let (engine, _store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::new("person", 2), record(json!({ "name": "a" })))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::SpecNotFound]);
}

#[tokio::test]
async fn inactive_spec_is_reported_before_bad_data() {
    let (engine, _store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::latest("retired"), record(json!({})))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::SpecNotActive]);
}

#[tokio::test]
async fn field_failures_are_aggregated_before_step_resolution() {
    let (engine, store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::latest("broken"), record(json!({ "age": "ten" })))
        .await
        .unwrap_err();
    assert_eq!(
        kinds(&failures),
        vec![FailureKind::DataValidationFailed, FailureKind::DataValidationFailed]
    );
    let fields: Vec<_> = failures.iter().filter_map(|f| f.field.as_deref()).collect();
    assert_eq!(fields, vec!["name", "age"]);
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn initial_step_failures_are_aggregated() {
    let (engine, _store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::latest("broken"), record(json!({ "name": "ann" })))
        .await
        .unwrap_err();
    assert_eq!(
        kinds(&failures),
        vec![FailureKind::SpecNotFound, FailureKind::SpecNotActive]
    );
    assert_eq!(failures[0].spec_id.as_ref().map(|s| s.name.as_str()), Some("ghost"));
}

#[tokio::test]
async fn guard_errors_are_aggregated_and_nothing_is_written() {
    let (engine, store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::latest("guarded"), record(json!({})))
        .await
        .unwrap_err();
    assert_eq!(
        kinds(&failures),
        vec![FailureKind::GuardEvaluationFailed, FailureKind::GuardEvaluationFailed]
    );
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn process_without_steps_is_never_persisted() {
    let (engine, store) = engine(SPECS);
    let failures = engine
        .create_process(&SpecId::latest("nobody"), record(json!({})))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::ProcessHasNoSteps]);
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn rejected_submission_changes_nothing() {
    let (engine, store) = engine(SPECS);
    let key = engine
        .create_process(&SpecId::latest("person"), record(json!({ "name": "ann" })))
        .await
        .unwrap();
    let intake = only_step(&engine, &key, "intake").await;
    engine.select_step(&intake.instance_key).await.unwrap();
    let before = engine.process_instance(&key).await.unwrap();
    let commits = store.commits();

    let failures = engine
        .submit_step(&intake.instance_key, record(json!({ "name": "" })))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::DataValidationFailed]);
    assert_eq!(failures[0].field.as_deref(), Some("name"));

    assert_eq!(store.commits(), commits);
    assert_eq!(engine.process_instance(&key).await.unwrap(), before);
    let view = engine.process_view(&key).await.unwrap();
    assert_eq!(view.steps.len(), 1);
    assert_eq!(view.steps[0].status, StepStatus::Ready);
}

#[tokio::test]
async fn successor_guard_error_rejects_submission() {
    let (engine, store) = engine(SPECS);
    let key = engine
        .create_process(&SpecId::latest("person"), record(json!({ "name": "ann" })))
        .await
        .unwrap();
    let intake = only_step(&engine, &key, "intake").await;
    engine.select_step(&intake.instance_key).await.unwrap();
    let commits = store.commits();

    let failures = engine
        .submit_step(&intake.instance_key, record(json!({ "name": "ann", "age": "x" })))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::DataValidationFailed]);

    let failures = engine
        .submit_step(&intake.instance_key, record(json!({ "name": "ann" })))
        .await
        .unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::GuardEvaluationFailed]);
    assert_eq!(failures[0].spec_id, Some(SpecId::new("review", 1)));
    assert_eq!(store.commits(), commits);
    assert_eq!(
        engine.step_instance(&intake.instance_key).await.unwrap().status,
        StepStatus::Ready
    );
}

#[tokio::test]
async fn access_is_checked_on_step_operations() {
    let (engine, _store) = engine(SPECS);
    let key = engine
        .create_process(&SpecId::latest("person"), record(json!({ "name": "ann" })))
        .await
        .unwrap();
    let intake = only_step(&engine, &key, "intake").await;

    let outsider = engine.with_identity(Arc::new(
        StaticIdentity::new(Actor::new("eve")).allow_only(["other"]),
    ));
    let failures = outsider.select_step(&intake.instance_key).await.unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::AccessDenied]);

    let failures = as_actor(&engine, "bob").select_step("no-such-step").await.unwrap_err();
    assert_eq!(kinds(&failures), vec![FailureKind::InstanceNotFound]);
}
