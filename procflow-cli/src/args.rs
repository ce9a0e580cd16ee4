use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Postgres connection URL. Falls back to `DATABASE_URL`.
    #[arg(long, env = "PROCFLOW_DATABASE_URL")]
    pub store: Option<String>,
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,
}

/// Spec documents and engine settings needed to drive instances.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Spec document(s) to register, JSON or YAML.
    #[arg(long = "specs", value_name = "PATH", required = true)]
    pub specs: Vec<PathBuf>,
    /// Identity the engine acts as.
    #[arg(long, env = "PROCFLOW_ACTOR")]
    pub actor: Option<String>,
    #[arg(long, default_value_t = 256)]
    pub max_system_steps: usize,
    /// Let a later document replace an already registered spec version.
    #[arg(long)]
    pub replace_duplicates: bool,
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// JSON or YAML object with field values.
    #[arg(long)]
    pub inputs: Option<PathBuf>,
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set_inputs: Vec<String>,
}
