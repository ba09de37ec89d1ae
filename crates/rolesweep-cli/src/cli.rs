//! CLI structure and argument parsing

use crate::commands::Commands;
use clap::Parser;
use std::path::PathBuf;

/// Rolesweep - orphaned role assignment scanner and remover
#[derive(Debug, Parser)]
#[command(name = "rolesweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Commands
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}
