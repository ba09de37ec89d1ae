//! Rolesweep CLI entry point

use clap::Parser;
use rolesweep_cli::config::CliConfig;
use rolesweep_cli::{output, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&e.to_string());
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> rolesweep_cli::Result<i32> {
    let config = CliConfig::load(cli.config.as_deref())?;
    cli.command.execute(config).await
}
