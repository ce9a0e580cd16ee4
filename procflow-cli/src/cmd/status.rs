use std::sync::Arc;

use procflow_core::{DuplicatePolicy, SpecRegistry};
use procflow_exec::{Engine, ProcessView, StaticIdentity};

use crate::cmd::config::connect_store;
use crate::exit_codes;
use crate::output::{print_failures, print_result, OutputFormat};
use crate::{OutputArgs, StoreArgs};

fn print_text(view: &ProcessView) {
    let p = &view.process;
    println!("process {} ({}) {}", p.instance_key, p.spec_id, p.status.as_str());
    for step in &view.steps {
        match step.active_actor() {
            Some(actor) => println!(
                "  {} {} {} [{}]",
                step.instance_key,
                step.spec_id,
                step.status.as_str(),
                actor
            ),
            None => println!(
                "  {} {} {}",
                step.instance_key,
                step.spec_id,
                step.status.as_str()
            ),
        }
    }
}

/// Reading instances needs no spec documents, so the engine gets an empty
/// registry and no identity.
pub async fn status_cmd(process_key: &str, store: StoreArgs, output: OutputArgs) -> i32 {
    let pg = match connect_store(&store, &output).await {
        Ok(s) => s,
        Err(code) => return code,
    };
    let engine = Engine::new(
        Arc::new(pg),
        Arc::new(SpecRegistry::new(DuplicatePolicy::Reject)),
        Arc::new(StaticIdentity::anonymous()),
    );

    match engine.process_view(process_key).await {
        Ok(view) => {
            if output.format == OutputFormat::Text && !output.quiet {
                print_text(&view);
            } else {
                print_result(output.format, output.quiet, &view);
            }
            exit_codes::SUCCESS
        }
        Err(failures) => print_failures(output.format, output.quiet, &failures),
    }
}
