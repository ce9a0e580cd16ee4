use std::path::Path;

use procflow_core::{parse_document_str, DocumentFormat, Validate};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResult {
    valid: bool,
    format: String,
    processes: usize,
    steps: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, output: OutputArgs) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let parsed = match parse_document_str(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let doc = &parsed.document;
    let errors: Vec<String> = match doc.validate() {
        Ok(()) => vec![],
        Err(err) => err
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect(),
    };
    let result = ValidateResult {
        valid: errors.is_empty(),
        format: format!("{:?}", parsed.format),
        processes: doc.processes.len(),
        steps: doc.steps.len(),
        errors,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if result.valid {
            println!(
                "ok: {} process spec(s), {} step spec(s) ({})",
                result.processes, result.steps, result.format
            );
        } else {
            eprintln!("error: validation failed");
            for e in &result.errors {
                eprintln!("- {e}");
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}
