use std::path::Path;
use std::sync::Arc;

use procflow_core::types::Record;
use procflow_core::{parse_document_str, validate_document, DocumentFormat, DuplicatePolicy, SpecRegistry};
use procflow_exec::{
    Actor, CompositeEventSink, Engine, EngineConfig, RecordingEventSink, StaticIdentity, TracingEventSink,
};
use procflow_store::PostgresStore;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::exit_codes;
use crate::output::print_error;
use crate::utils::redact_url_password;
use crate::{EngineArgs, InputArgs, OutputArgs, StoreArgs};

/// Read field values from `--inputs` and apply `--set` overrides on top.
pub fn load_inputs(inputs: &InputArgs, output: &OutputArgs) -> Result<Record, i32> {
    let mut record = match &inputs.inputs {
        Some(path) => read_record(path, output)?,
        None => Record::new(),
    };
    merge_set_inputs(&mut record, &inputs.set_inputs, output)?;
    Ok(record)
}

fn read_record(path: &Path, output: &OutputArgs) -> Result<Record, i32> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        print_error(output.format, output.quiet, &format!("failed to read inputs: {e}"));
        exit_codes::RUNTIME_ERROR
    })?;
    let value: JsonValue = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(&content).map_err(|_| {
            print_error(output.format, output.quiet, "inputs file is neither valid JSON nor YAML");
            exit_codes::VALIDATION_FAILED
        })?,
    };
    match value {
        JsonValue::Object(map) => Ok(map),
        _ => {
            print_error(output.format, output.quiet, "inputs must be an object of field values");
            Err(exit_codes::VALIDATION_FAILED)
        }
    }
}

/// `KEY=VALUE` pairs. Values that parse as JSON keep their type, anything
/// else is taken as a string.
pub fn merge_set_inputs(record: &mut Record, set_inputs: &[String], output: &OutputArgs) -> Result<(), i32> {
    for s in set_inputs {
        let Some((key, raw)) = s.split_once('=') else {
            print_error(output.format, output.quiet, &format!("expected KEY=VALUE, got '{s}'"));
            return Err(exit_codes::VALIDATION_FAILED);
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()));
        record.insert(key.to_string(), value);
    }
    Ok(())
}

pub fn database_url(store: &StoreArgs, output: &OutputArgs) -> Result<String, i32> {
    store
        .store
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| {
            print_error(
                output.format,
                output.quiet,
                "missing database url (use --store or set PROCFLOW_DATABASE_URL / DATABASE_URL)",
            );
            exit_codes::RUNTIME_ERROR
        })
}

pub async fn connect_store(store: &StoreArgs, output: &OutputArgs) -> Result<PostgresStore, i32> {
    let url = database_url(store, output)?;
    PostgresStore::connect(&url, store.max_connections)
        .await
        .map_err(|e| {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to connect to {}: {e}", redact_url_password(&url)),
            );
            exit_codes::RUNTIME_ERROR
        })
}

/// Parse, validate, and register every spec document named by `--specs`.
pub fn load_registry(paths: &[impl AsRef<Path>], policy: DuplicatePolicy, output: &OutputArgs) -> Result<SpecRegistry, i32> {
    let registry = SpecRegistry::new(policy);
    for path in paths {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            print_error(output.format, output.quiet, &format!("failed to read {}: {e}", path.display()));
            exit_codes::RUNTIME_ERROR
        })?;
        let parsed = parse_document_str(&content, DocumentFormat::Auto).map_err(|e| {
            print_error(output.format, output.quiet, &format!("{}: {e}", path.display()));
            exit_codes::VALIDATION_FAILED
        })?;
        if let Err(err) = validate_document(&parsed.document) {
            for v in &err.violations {
                print_error(output.format, output.quiet, &format!("{}: {}: {}", path.display(), v.path, v.message));
            }
            return Err(exit_codes::VALIDATION_FAILED);
        }
        debug!(
            path = %path.display(),
            processes = parsed.document.processes.len(),
            steps = parsed.document.steps.len(),
            "registering spec document"
        );
        registry.register_document(parsed.document).map_err(|e| {
            print_error(output.format, output.quiet, &format!("{}: {e}", path.display()));
            exit_codes::VALIDATION_FAILED
        })?;
    }
    Ok(registry)
}

/// The engine logs events through tracing and also records them, so commands
/// can report what a call changed.
pub async fn build_engine(
    engine: &EngineArgs,
    store: &StoreArgs,
    output: &OutputArgs,
) -> Result<(Engine, Arc<RecordingEventSink>), i32> {
    let config = EngineConfig {
        max_system_steps_per_run: engine.max_system_steps,
        duplicate_specs: if engine.replace_duplicates {
            DuplicatePolicy::Replace
        } else {
            DuplicatePolicy::Reject
        },
    };
    let registry = load_registry(&engine.specs, config.duplicate_specs, output)?;
    let pg = connect_store(store, output).await?;

    let identity = match &engine.actor {
        Some(id) => StaticIdentity::new(Actor::new(id.clone())),
        None => StaticIdentity::anonymous(),
    };

    let recorded = Arc::new(RecordingEventSink::new());
    let events = CompositeEventSink::new()
        .with(Arc::new(TracingEventSink))
        .with(recorded.clone());

    let engine = Engine::new(Arc::new(pg), Arc::new(registry), Arc::new(identity))
        .with_config(config)
        .with_events(Arc::new(events));
    Ok((engine, recorded))
}
