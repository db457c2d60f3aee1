use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::Result;
use clap::Parser;
use grid_core::{CommandInstaller, Supervisor, SupervisorOptions, UnixProcessControl};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod logger;

pub const DEFAULT_FILENAMES: &[&str] = &["grid.toml"];
pub const DEFAULT_STATE_DIR: &str = ".grid";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = config::Cli::parse();
    let mut logger = logger::Logger::default();

    match run(cli, &mut logger).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            logger.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: config::Cli, logger: &mut logger::Logger) -> Result<bool> {
    let file = cli.file.unwrap_or_else(|| {
        for filename in DEFAULT_FILENAMES {
            if Path::new(filename).exists() {
                return (*filename).to_string();
            }
        }
        "grid.toml".to_string()
    });
    let grid = grid_config::load_from_path(Path::new(&file))?;
    tracing::debug!("loaded {} services from {file}", grid.services.len());

    let state_dir = cli
        .state_dir
        .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

    let mut options = SupervisorOptions::default();
    if let config::Commands::Stop {
        timeout: Some(secs),
        ..
    } = &cli.command
    {
        options.stop_timeout = Duration::from_secs(*secs);
    }

    let supervisor = Supervisor::new(
        grid,
        &state_dir,
        UnixProcessControl::new(),
        Box::new(CommandInstaller::new(state_dir.join("log"))),
        options,
    )?;

    match cli.command {
        config::Commands::Install { service } => {
            commands::install::install(&supervisor, logger, &service).await
        }
        config::Commands::Start { service } => {
            commands::start::start(&supervisor, logger, &service).await
        }
        config::Commands::Stop { service, .. } => {
            commands::stop::stop(&supervisor, logger, &service).await
        }
        config::Commands::Status { service } => {
            commands::status::status(&supervisor, logger, service.as_deref().unwrap_or("all"))
        }
        config::Commands::Bootstrap => {
            commands::bootstrap::bootstrap(&supervisor, logger).await
        }
    }
}
