use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use crate::cli::args::{Cli, CliCommand};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("certctl error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Setup(args) => {
            let runtime = tokio::runtime::Runtime::new()
                .context("Failed to initialize async runtime for setup")?;
            runtime.block_on(commands::setup::run_setup_command(cli.config, &args))?;
        }
    }
    Ok(())
}
