//! Scan orchestration
//!
//! Drives one full scan run: subscriptions fan out under a bounded worker
//! pool, the hierarchy is walked once and its nodes scanned sequentially,
//! then everything merges behind a join barrier and is exported to the
//! candidate artifact. One scope failing contributes zero records and never
//! aborts the others.

use crate::artifact;
use crate::config::SweepConfig;
use crate::error::SweepResult;
use crate::hierarchy;
use crate::model::ScanResult;
use crate::provider::SweepSession;
use crate::scanner::{OrphanScanner, ScanOutput};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

enum SubscriptionOutcome {
    Scanned(ScanOutput),
    Failed(String),
    /// Abandoned because the time budget expired before the scan started
    OutOfTime,
}

/// Runs the two scan phases and exports the merged candidate list
pub struct ScanOrchestrator {
    session: SweepSession,
    config: SweepConfig,
}

impl ScanOrchestrator {
    pub fn new(session: SweepSession, config: SweepConfig) -> Self {
        Self { session, config }
    }

    /// Run the full scan. An empty candidate list is a normal success
    /// outcome; the artifact is only written when candidates were found.
    pub async fn run_scan(&self) -> SweepResult<ScanResult> {
        // provisioning prerequisite for the hierarchy phase; failing it here
        // aborts the run before any scope is scanned
        self.session.hierarchy().ensure_registered().await?;

        let started_at = Utc::now();
        let deadline = self
            .config
            .time_budget()
            .map(|budget| Instant::now() + budget);

        let mut result = ScanResult {
            records: Vec::new(),
            scopes_scanned: 0,
            scopes_failed: 0,
            scopes_skipped: 0,
            verification_errors: 0,
            started_at,
            finished_at: started_at,
        };

        self.run_subscription_phase(deadline, &mut result).await;
        self.run_hierarchy_phase(deadline, &mut result).await?;

        let before = result.records.len();
        result.records.retain(|r| r.is_well_formed());
        if result.records.len() < before {
            warn!(
                "dropped {} malformed candidate(s) before export",
                before - result.records.len()
            );
        }

        if result.records.is_empty() {
            info!("scan found no orphaned assignments, artifact not written");
        } else {
            artifact::write(&self.config.artifact_path, &result.records)?;
            info!(
                "exported {} candidate(s) to {}",
                result.records.len(),
                self.config.artifact_path.display()
            );
        }

        result.finished_at = Utc::now();
        Ok(result)
    }

    async fn run_subscription_phase(&self, deadline: Option<Instant>, result: &mut ScanResult) {
        let subscriptions = self.eligible_subscriptions();
        if subscriptions.is_empty() {
            info!("no eligible subscriptions to scan");
            return;
        }
        info!(
            "scanning {} subscription(s) with up to {} in flight",
            subscriptions.len(),
            self.config.max_parallel
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut tasks: JoinSet<(String, SubscriptionOutcome)> = JoinSet::new();

        for subscription_id in subscriptions {
            let semaphore = semaphore.clone();
            let scanner = OrphanScanner::new(self.session.clone());
            let include_resource_groups = self.config.include_resource_groups;
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            subscription_id,
                            SubscriptionOutcome::Failed("scan pool closed".to_string()),
                        )
                    }
                };
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return (subscription_id, SubscriptionOutcome::OutOfTime);
                }
                let outcome = match scanner
                    .scan_subscription(&subscription_id, include_resource_groups)
                    .await
                {
                    Ok(output) => SubscriptionOutcome::Scanned(output),
                    Err(e) => SubscriptionOutcome::Failed(e.to_string()),
                };
                (subscription_id, outcome)
            });
        }

        // join barrier: merging happens only after every worker is done
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, SubscriptionOutcome::Scanned(output))) => {
                    result.scopes_scanned += 1;
                    result.verification_errors += output.verification_errors;
                    result.scopes_failed += output.failed_scopes;
                    result.records.extend(output.records);
                }
                Ok((subscription_id, SubscriptionOutcome::Failed(detail))) => {
                    error!("subscription '{}' scan failed: {}", subscription_id, detail);
                    result.scopes_failed += 1;
                }
                Ok((subscription_id, SubscriptionOutcome::OutOfTime)) => {
                    warn!(
                        "subscription '{}' not scanned, time budget exhausted",
                        subscription_id
                    );
                    result.scopes_skipped += 1;
                }
                Err(join_error) => {
                    error!("subscription scan task aborted: {}", join_error);
                    result.scopes_failed += 1;
                }
            }
        }
    }

    async fn run_hierarchy_phase(
        &self,
        deadline: Option<Instant>,
        result: &mut ScanResult,
    ) -> SweepResult<()> {
        let nodes = hierarchy::walk(&self.session, self.config.hierarchy_root.as_deref()).await?;
        info!("scanning {} hierarchy node(s) sequentially", nodes.len());

        let scanner = OrphanScanner::new(self.session.clone());
        let mut nodes = nodes.into_iter();
        while let Some(node) = nodes.next() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let remaining = 1 + nodes.len();
                warn!(
                    "time budget exhausted, {} hierarchy node(s) left unscanned",
                    remaining
                );
                result.scopes_skipped += remaining;
                break;
            }
            match scanner
                .scan_management_group(&node.name, &node.display_name)
                .await
            {
                Ok(output) => {
                    result.scopes_scanned += 1;
                    result.verification_errors += output.verification_errors;
                    result.records.extend(output.records);
                }
                Err(e) => {
                    error!("hierarchy node '{}' scan failed: {}", node.name, e);
                    result.scopes_failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Well-formed, non-excluded subscription ids, in input order
    fn eligible_subscriptions(&self) -> Vec<String> {
        let mut eligible = Vec::new();
        for subscription_id in &self.config.subscriptions {
            if Uuid::parse_str(subscription_id).is_err() {
                warn!("skipping malformed subscription id '{}'", subscription_id);
                continue;
            }
            if self.config.is_excluded(subscription_id) {
                warn!("skipping excluded subscription '{}'", subscription_id);
                continue;
            }
            eligible.push(subscription_id.clone());
        }
        eligible
    }
}
