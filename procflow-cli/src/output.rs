use procflow_core::{Failure, FailureKind};
use serde::Serialize;

use crate::exit_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    let rendered = match format {
        OutputFormat::Text => serde_json::to_string_pretty(result),
        OutputFormat::Json => serde_json::to_string(result),
    };
    if let Ok(json) = rendered {
        println!("{json}");
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("error: {message}"),
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
    }
}

/// Report engine failures and pick the matching exit code.
pub fn print_failures(format: OutputFormat, quiet: bool, failures: &[Failure]) -> i32 {
    if !quiet {
        match format {
            OutputFormat::Text => {
                for f in failures {
                    eprintln!("error: {f}");
                }
            }
            OutputFormat::Json => {
                let body = serde_json::json!({ "failures": failures });
                eprintln!("{}", serde_json::to_string(&body).unwrap_or_default());
            }
        }
    }
    failure_exit_code(failures)
}

pub fn failure_exit_code(failures: &[Failure]) -> i32 {
    if failures.iter().any(|f| f.kind == FailureKind::Store) {
        return exit_codes::RUNTIME_ERROR;
    }
    let validation = failures.iter().all(|f| {
        matches!(
            f.kind,
            FailureKind::SpecNotFound
                | FailureKind::SpecNotActive
                | FailureKind::SpecKindMismatch
                | FailureKind::DataValidationFailed
                | FailureKind::DataCalculation
                | FailureKind::GuardEvaluationFailed
        )
    });
    if validation {
        exit_codes::VALIDATION_FAILED
    } else {
        exit_codes::OPERATION_FAILED
    }
}
