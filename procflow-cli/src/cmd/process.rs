use procflow_core::SpecId;
use procflow_exec::EngineEvent;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::cmd::config::{build_engine, load_inputs};
use crate::exit_codes;
use crate::output::{print_error, print_failures, print_result, OutputFormat};
use crate::{EngineArgs, InputArgs, OutputArgs, StoreArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateResult {
    process_instance_key: String,
    status: &'static str,
    events: Vec<EngineEvent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminResult {
    process_instance_key: String,
    action: &'static str,
    events: Vec<EngineEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admin {
    Suspend,
    Resume,
    Terminate,
    /// Run system steps that are still EXECUTE_READY.
    Advance,
}

impl Admin {
    fn as_str(&self) -> &'static str {
        match self {
            Admin::Suspend => "suspended",
            Admin::Resume => "resumed",
            Admin::Terminate => "terminated",
            Admin::Advance => "advanced",
        }
    }
}

/// `order` or `order@2`, same as references inside spec documents.
fn parse_spec_ref(reference: &str) -> Result<SpecId, String> {
    serde_json::from_value(JsonValue::String(reference.to_string())).map_err(|e| e.to_string())
}

pub async fn create_cmd(
    process: &str,
    inputs: InputArgs,
    engine: EngineArgs,
    store: StoreArgs,
    output: OutputArgs,
) -> i32 {
    let spec_id = match parse_spec_ref(process) {
        Ok(id) => id,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let data = match load_inputs(&inputs, &output) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };

    let key = match engine.create_process(&spec_id, data).await {
        Ok(k) => k,
        Err(failures) => return print_failures(output.format, output.quiet, &failures),
    };
    let status = match engine.process_instance(&key).await {
        Ok(p) => p.status.as_str(),
        Err(failures) => return print_failures(output.format, output.quiet, &failures),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("{key}");
    } else {
        let result = CreateResult {
            process_instance_key: key,
            status,
            events: recorded.events(),
        };
        print_result(output.format, output.quiet, &result);
    }
    exit_codes::SUCCESS
}

pub async fn admin_cmd(
    action: Admin,
    process_key: &str,
    engine: EngineArgs,
    store: StoreArgs,
    output: OutputArgs,
) -> i32 {
    let (engine, recorded) = match build_engine(&engine, &store, &output).await {
        Ok(built) => built,
        Err(code) => return code,
    };

    let outcome = match action {
        Admin::Suspend => engine.suspend_process(process_key).await,
        Admin::Resume => engine.resume_process(process_key).await,
        Admin::Terminate => engine.terminate_process(process_key).await,
        Admin::Advance => engine.run_ready_system_steps(process_key).await,
    };
    if let Err(failures) = outcome {
        return print_failures(output.format, output.quiet, &failures);
    }

    if output.format == OutputFormat::Text && !output.quiet {
        println!("ok: {process_key} {}", action.as_str());
    } else {
        let result = AdminResult {
            process_instance_key: process_key.to_string(),
            action: action.as_str(),
            events: recorded.events(),
        };
        print_result(output.format, output.quiet, &result);
    }
    exit_codes::SUCCESS
}
