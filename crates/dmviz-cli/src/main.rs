//! Main entry point for the dmviz command line.

use anyhow::{Context, Result};
use dmviz_cli::{resolve_config, run, Args, CliError};
use dmviz_common::init_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_with_catalog();

    match try_main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CliError>() {
                Some(cli) if cli.is_data_load() => {
                    error!(error = %cli, "Snapshot could not be loaded");
                    eprintln!("{}", cli.user_message());
                }
                _ => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn try_main(args: Args) -> Result<()> {
    let config = resolve_config(&args).context("Failed to load configuration")?;

    // keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&config.logging).context("Failed to initialise logging")?;
    info!(chart = %args.chart, "Starting dmviz");

    let output = run(&config, &args).await?;
    println!("{output}");
    Ok(())
}
