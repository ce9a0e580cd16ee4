use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and structurally validate a spec document.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Evaluate an expression (or a JSON condition list) against field values.
    Eval {
        expression: String,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Apply database migrations.
    Migrate {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a process instance from a registered process spec.
    Create {
        /// `name` for the latest version or `name@version`.
        process: String,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Claim a ready input step for the current actor.
    Select {
        step_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Release a claimed input step.
    Return {
        step_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Store a draft of a claimed input step's data.
    Save {
        step_key: String,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Complete a claimed input step and advance the process.
    Submit {
        step_key: String,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Suspend {
        process_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Resume {
        process_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Terminate {
        process_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run system steps of a process that are still waiting to execute.
    Advance {
        process_key: String,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a process instance and its step instances.
    Status {
        process_key: String,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
