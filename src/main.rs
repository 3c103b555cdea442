//! redmine - work with a Redmine server from the command line.

use std::process::ExitCode;

use clap::Parser;

use redmine_client::config::Config;
use redmine_client::error::AppError;
use redmine_client::{cli, logging, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => cli::run(cli, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("Hint: {}", action);
            }
            if let Some(dir) = logging::log_directory() {
                eprintln!("Logs: {}", dir.display());
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let config = match &cli.global.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
