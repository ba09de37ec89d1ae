//! Scan command

use crate::config::CliConfig;
use crate::error::Result;
use crate::{output, providers};
use clap::Args;
use rolesweep_core::{ScanOrchestrator, SweepConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Subscription ids to scan; repeatable
    #[arg(short, long = "subscription", value_name = "ID")]
    pub subscriptions: Vec<String>,

    /// Hierarchy root to walk; the provider default root when omitted
    #[arg(long)]
    pub root: Option<String>,

    /// Maximum concurrent subscription scans
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Also scan every resource group under each subscription
    #[arg(long)]
    pub include_resource_groups: bool,

    /// Subscription ids to exclude; repeatable
    #[arg(long = "exclude", value_name = "ID")]
    pub excluded: Vec<String>,

    /// Candidate artifact output path
    #[arg(short, long, default_value = "orphaned-assignments.json")]
    pub out: PathBuf,

    /// Stop dispatching new scopes after this many seconds and export the
    /// partial result
    #[arg(long, value_name = "SECONDS")]
    pub time_budget: Option<u64>,
}

pub async fn execute(args: ScanArgs, config: CliConfig) -> Result<i32> {
    let session = providers::build_session(&config)?;

    let mut excluded = config.excluded_subscriptions.clone();
    excluded.extend(args.excluded);

    let sweep_config = SweepConfig {
        subscriptions: args.subscriptions,
        excluded_subscriptions: excluded,
        hierarchy_root: args.root,
        max_parallel: args.max_parallel.unwrap_or(config.max_parallel),
        include_resource_groups: args.include_resource_groups,
        admin_roles: config.admin_roles,
        artifact_path: args.out,
        time_budget_secs: args.time_budget,
        what_if: false,
    };
    let artifact_path = sweep_config.artifact_path.clone();

    let result = ScanOrchestrator::new(session, sweep_config)
        .run_scan()
        .await?;

    output::header("Scan summary");
    output::kv("Scopes scanned", &result.scopes_scanned.to_string());
    output::kv("Scopes failed", &result.scopes_failed.to_string());
    output::kv("Scopes skipped", &result.scopes_skipped.to_string());
    output::kv(
        "Unverifiable principals",
        &result.verification_errors.to_string(),
    );
    output::kv("Candidates", &result.records.len().to_string());

    if result.records.is_empty() {
        output::success("no orphaned assignments found");
    } else {
        output::success(&format!(
            "{} candidate(s) exported to {}",
            result.records.len(),
            artifact_path.display()
        ));
        output::info("review the artifact, then run 'rolesweep remove' to act on it");
    }
    if !result.is_clean() {
        output::warn("some scopes could not be fully scanned; see the log for details");
    }

    Ok(0)
}
