use procflow_core::Failure;
use procflow_exec::{Engine, EngineEvent, RecordingEventSink};
use serde::Serialize;

use crate::cmd::config::{build_engine, load_inputs};
use crate::exit_codes;
use crate::output::{print_failures, print_result, OutputFormat};
use crate::{EngineArgs, InputArgs, OutputArgs, StoreArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepResult {
    step_instance_key: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_actor: Option<String>,
    events: Vec<EngineEvent>,
}

/// Report the step's state after a successful call.
async fn report(
    engine: &Engine,
    recorded: &RecordingEventSink,
    step_key: &str,
    output: &OutputArgs,
) -> i32 {
    let step = match engine.step_instance(step_key).await {
        Ok(s) => s,
        Err(failures) => return print_failures(output.format, output.quiet, &failures),
    };
    let result = StepResult {
        step_instance_key: step_key.to_string(),
        status: step.status.as_str(),
        active_actor: step.active_actor().map(str::to_string),
        events: recorded.events(),
    };
    if output.format == OutputFormat::Text && !output.quiet {
        println!("ok: {step_key} {}", result.status);
    } else {
        print_result(output.format, output.quiet, &result);
    }
    exit_codes::SUCCESS
}

async fn finish(
    engine: &Engine,
    recorded: &RecordingEventSink,
    step_key: &str,
    outcome: Result<(), Vec<Failure>>,
    output: &OutputArgs,
) -> i32 {
    match outcome {
        Ok(()) => report(engine, recorded, step_key, output).await,
        Err(failures) => print_failures(output.format, output.quiet, &failures),
    }
}

pub async fn select_cmd(step_key: &str, engine: EngineArgs, store: StoreArgs, output: OutputArgs) -> i32 {
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };
    let outcome = engine.select_step(step_key).await;
    finish(&engine, &recorded, step_key, outcome, &output).await
}

pub async fn return_cmd(step_key: &str, engine: EngineArgs, store: StoreArgs, output: OutputArgs) -> i32 {
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };
    let outcome = engine.return_step(step_key).await;
    finish(&engine, &recorded, step_key, outcome, &output).await
}

pub async fn save_cmd(
    step_key: &str,
    inputs: InputArgs,
    engine: EngineArgs,
    store: StoreArgs,
    output: OutputArgs,
) -> i32 {
    let data = match load_inputs(&inputs, &output) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };
    let outcome = engine.save_step(step_key, data).await;
    finish(&engine, &recorded, step_key, outcome, &output).await
}

pub async fn submit_cmd(
    step_key: &str,
    inputs: InputArgs,
    engine: EngineArgs,
    store: StoreArgs,
    output: OutputArgs,
) -> i32 {
    let data = match load_inputs(&inputs, &output) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };
    let outcome = engine.submit_step(step_key, data).await;
    finish(&engine, &recorded, step_key, outcome, &output).await
}
