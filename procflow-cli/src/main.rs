use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "procflow", version, about = "Drive procflow process instances")]
struct Cli {
    /// Log engine activity at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate { path, output } => cmd::validate::validate_cmd(&path, output).await,
        Command::Eval {
            expression,
            inputs,
            output,
        } => cmd::eval::eval_cmd(&expression, inputs, output).await,
        Command::Migrate { store, output } => cmd::migrate::migrate_cmd(store, output).await,
        Command::Create {
            process,
            inputs,
            engine,
            store,
            output,
        } => cmd::process::create_cmd(&process, inputs, engine, store, output).await,
        Command::Select {
            step_key,
            engine,
            store,
            output,
        } => cmd::step::select_cmd(&step_key, engine, store, output).await,
        Command::Return {
            step_key,
            engine,
            store,
            output,
        } => cmd::step::return_cmd(&step_key, engine, store, output).await,
        Command::Save {
            step_key,
            inputs,
            engine,
            store,
            output,
        } => cmd::step::save_cmd(&step_key, inputs, engine, store, output).await,
        Command::Submit {
            step_key,
            inputs,
            engine,
            store,
            output,
        } => cmd::step::submit_cmd(&step_key, inputs, engine, store, output).await,
        Command::Suspend {
            process_key,
            engine,
            store,
            output,
        } => {
            cmd::process::admin_cmd(cmd::process::Admin::Suspend, &process_key, engine, store, output)
                .await
        }
        Command::Resume {
            process_key,
            engine,
            store,
            output,
        } => {
            cmd::process::admin_cmd(cmd::process::Admin::Resume, &process_key, engine, store, output)
                .await
        }
        Command::Terminate {
            process_key,
            engine,
            store,
            output,
        } => {
            cmd::process::admin_cmd(
                cmd::process::Admin::Terminate,
                &process_key,
                engine,
                store,
                output,
            )
            .await
        }
        Command::Advance {
            process_key,
            engine,
            store,
            output,
        } => {
            cmd::process::admin_cmd(cmd::process::Admin::Advance, &process_key, engine, store, output)
                .await
        }
        Command::Status {
            process_key,
            store,
            output,
        } => cmd::status::status_cmd(&process_key, store, output).await,
    }
}
