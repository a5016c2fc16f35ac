//! CLI probe for the lead distribution core.
//!
//! # Responsibility
//! - Verify `leadflow_core` linkage and database bootstrap from the shell.
//! - Print the operator roster with current active loads.
//!
//! Configuration comes from `LEADFLOW_DB_PATH`, `LEADFLOW_LOG_LEVEL` and
//! `LEADFLOW_LOG_DIR`; without a database path an empty in-memory database is
//! used.

use leadflow_core::repo::LIST_LIMIT_MAX;
use leadflow_core::{CoreConfig, ListQuery, RosterService};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Err(err) = config.init_logging() {
        eprintln!("leadflow_cli logging disabled: {err}");
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("leadflow_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("leadflow_core version={}", leadflow_core::core_version());

    let conn = config.open_db()?;
    let roster = RosterService::sqlite(&conn)?;
    let operators = roster.list_operators(&ListQuery::page(LIST_LIMIT_MAX, 0))?;
    if operators.is_empty() {
        println!("no operators configured");
    }
    for load in operators {
        println!(
            "operator id={} name={} active={} load={}/{}",
            load.operator.id,
            load.operator.name,
            load.operator.is_active,
            load.active_contacts,
            load.operator.max_active_leads
        );
    }
    Ok(())
}
