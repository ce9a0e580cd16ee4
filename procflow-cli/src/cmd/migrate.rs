use serde::Serialize;

use procflow_store::run_migrations;

use crate::cmd::config::connect_store;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct MigrateResult {
    success: bool,
    message: String,
}

pub async fn migrate_cmd(store: StoreArgs, output: OutputArgs) -> i32 {
    let pg = match connect_store(&store, &output).await {
        Ok(s) => s,
        Err(code) => return code,
    };

    match run_migrations(pg.pool()).await {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: migrations applied");
            } else {
                let result = MigrateResult {
                    success: true,
                    message: "migrations applied".to_string(),
                };
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("migration failed: {e}"));
            exit_codes::RUNTIME_ERROR
        }
    }
}
