//! Command implementations

pub mod remove;
pub mod scan;

use crate::config::CliConfig;
use crate::Result;
use clap::Subcommand;

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan subscriptions and the management hierarchy for orphaned role
    /// assignments
    Scan(scan::ScanArgs),

    /// Remove reviewed candidates under the admin guardrail
    Remove(remove::RemoveArgs),
}

impl Commands {
    /// Execute the command and return the process exit code
    pub async fn execute(self, config: CliConfig) -> Result<i32> {
        match self {
            Commands::Scan(args) => scan::execute(args, config).await,
            Commands::Remove(args) => remove::execute(args, config).await,
        }
    }
}
