//! dashprobe -- acceptance checks for a deployed ceph-dashboard.
//!
//! Loads `dashprobe.toml`, initializes logging and dispatches to one
//! handler per subcommand. Errors are printed to stderr and mapped to
//! the exit codes documented on [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use dashprobe_core::config::DashprobeConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // `config` reports load failures itself, so logging falls back to defaults.
    let loaded = DashprobeConfig::load_or_default(&cli.config).await;
    let mut general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        general.log_level = level;
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;

    tracing::debug!(config = %cli.config.display(), "dashprobe starting");

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Run(args) => commands::run::execute(args, loaded?, &writer).await,
        Commands::Probe => commands::probe::execute(loaded?, &writer).await,
        Commands::AddUser(args) => commands::add_user::execute(args, loaded?, &writer).await,
    }
}
