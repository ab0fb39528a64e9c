mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use coinstats_core::{default_config_path, ConfigHandle};

use crate::cli::Cli;
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Arc::new(ConfigHandle::from_file(config_path)?);
    let _log_guard = logging::init(config.snapshot().server.log_file.as_deref())?;

    let context = Context {
        config,
        database: cli.database.clone(),
    };
    if let Some(output) = commands::run(&cli, &context).await? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(ExitCode::SUCCESS)
}
