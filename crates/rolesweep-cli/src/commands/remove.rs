//! Remove command
//!
//! Consumes a reviewed candidate artifact. The artifact is the only source
//! of removal intent; there is deliberately no way to refresh it from a
//! live scan here.

use crate::config::CliConfig;
use crate::error::Result;
use crate::{output, providers};
use clap::Args;
use rolesweep_core::{artifact, RemovalEngine, SweepConfig};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct RemoveArgs {
    /// Reviewed candidate artifact produced by a scan run
    #[arg(short, long, default_value = "orphaned-assignments.json")]
    pub candidates: PathBuf,

    /// Verify and report without deleting anything
    #[arg(long)]
    pub what_if: bool,

    /// Skip the interactive confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

pub async fn execute(args: RemoveArgs, config: CliConfig) -> Result<i32> {
    let candidates = artifact::load(&args.candidates)?;
    if candidates.is_empty() {
        output::info("candidate artifact is empty, nothing to do");
        return Ok(0);
    }
    output::info(&format!(
        "{} candidate(s) loaded from {}",
        candidates.len(),
        args.candidates.display()
    ));

    if !args.what_if && !args.yes {
        let proceed = confirm(&format!(
            "Delete up to {} role assignment(s)?",
            candidates.len()
        ))?;
        if !proceed {
            output::info("aborted, nothing was removed");
            return Ok(0);
        }
    }

    let session = providers::build_session(&config)?;
    let sweep_config = SweepConfig {
        admin_roles: config.admin_roles,
        what_if: args.what_if,
        ..Default::default()
    };
    let report = RemovalEngine::new(session, sweep_config)
        .run(candidates)
        .await?;

    output::header(if args.what_if {
        "Removal summary (dry run)"
    } else {
        "Removal summary"
    });
    for (code, count) in report.counts_by_code() {
        output::kv(code, &count.to_string());
    }

    if report.failed() > 0 {
        output::warn(&format!(
            "{} candidate(s) failed to remove and need operator attention",
            report.failed()
        ));
        return Ok(2);
    }
    if args.what_if {
        output::success(&format!(
            "{} assignment(s) would be removed",
            report.would_remove()
        ));
    } else {
        output::success(&format!("{} assignment(s) removed", report.removed()));
    }
    Ok(0)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
