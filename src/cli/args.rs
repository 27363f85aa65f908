use std::path::PathBuf;

use certctl::SetupArgs;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Path to configuration file (default: certctl.toml)
    #[arg(long, short, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Setup a Vault PKI backend including all necessary requirements
    Setup(Box<SetupArgs>),
}
