//! Guarded removal of reviewed candidates
//!
//! Each candidate moves through a per-record state machine:
//! verified first (the principal must still be absent and the assignment
//! must still exist as recorded), then guardrail-checked, then deleted by
//! the exact recorded triple. Candidates are processed sequentially;
//! deletions are destructive and low-volume, so auditable ordering wins
//! over throughput. One record's failure never aborts the batch.

use crate::config::SweepConfig;
use crate::error::SweepResult;
use crate::model::{scope, AssignmentRecord};
use crate::provider::{DeleteOutcome, SweepSession};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Why a candidate was skipped instead of deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The principal exists again; the scan-time result is stale
    PrincipalExistsNow,
    /// The assignment no longer exists as recorded
    AssignmentGone,
    /// Deleting would leave the subscription without an administrative
    /// principal
    GuardrailLastAdmin,
    /// The provider reported the assignment concurrently modified or gone
    PreconditionFailed,
    /// A re-verification call failed; the orphan state cannot be confirmed
    VerificationError,
}

impl SkipReason {
    /// Machine-distinguishable reason code for downstream reporting
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::PrincipalExistsNow => "principal-exists-now",
            SkipReason::AssignmentGone => "assignment-gone",
            SkipReason::GuardrailLastAdmin => "guardrail-last-admin",
            SkipReason::PreconditionFailed => "precondition-failed",
            SkipReason::VerificationError => "verification-error",
        }
    }
}

/// Terminal state of one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    /// Verified and clear to remove, but the run was a dry run
    WouldRemove,
    Skipped(SkipReason),
    Failed(String),
}

impl RemovalOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            RemovalOutcome::Removed => "removed",
            RemovalOutcome::WouldRemove => "would-remove",
            RemovalOutcome::Skipped(reason) => reason.code(),
            RemovalOutcome::Failed(_) => "other-error",
        }
    }
}

/// One candidate with its terminal state
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub record: AssignmentRecord,
    pub outcome: RemovalOutcome,
}

/// Aggregate result of a removal run
#[derive(Debug, Clone, Default)]
pub struct RemovalReport {
    pub outcomes: Vec<CandidateOutcome>,
}

impl RemovalReport {
    pub fn removed(&self) -> usize {
        self.count_matching(|o| matches!(o, RemovalOutcome::Removed))
    }

    pub fn would_remove(&self) -> usize {
        self.count_matching(|o| matches!(o, RemovalOutcome::WouldRemove))
    }

    pub fn skipped(&self) -> usize {
        self.count_matching(|o| matches!(o, RemovalOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count_matching(|o| matches!(o, RemovalOutcome::Failed(_)))
    }

    /// Outcome counts keyed by reason code, for operator reporting
    pub fn counts_by_code(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for candidate in &self.outcomes {
            *counts.entry(candidate.outcome.code()).or_insert(0) += 1;
        }
        counts
    }

    fn count_matching(&self, predicate: impl Fn(&RemovalOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|c| predicate(&c.outcome))
            .count()
    }
}

/// Consumes a reviewed candidate list and removes what still qualifies
pub struct RemovalEngine {
    session: SweepSession,
    config: SweepConfig,
}

impl RemovalEngine {
    pub fn new(session: SweepSession, config: SweepConfig) -> Self {
        Self { session, config }
    }

    /// Process every candidate sequentially and report terminal states
    pub async fn run(&self, candidates: Vec<AssignmentRecord>) -> SweepResult<RemovalReport> {
        info!(
            "processing {} candidate(s){}",
            candidates.len(),
            if self.config.what_if { " (dry run)" } else { "" }
        );

        let mut report = RemovalReport::default();
        for record in candidates {
            let outcome = self.process(&record).await;
            match &outcome {
                RemovalOutcome::Removed => {
                    info!("removed assignment '{}' at {}", record.assignment_name, record.scope)
                }
                RemovalOutcome::WouldRemove => {
                    info!(
                        "would remove assignment '{}' at {}",
                        record.assignment_name, record.scope
                    )
                }
                RemovalOutcome::Skipped(reason) => {
                    warn!(
                        "skipped assignment '{}' at {}: {}",
                        record.assignment_name,
                        record.scope,
                        reason.code()
                    )
                }
                RemovalOutcome::Failed(detail) => {
                    error!(
                        "failed to remove assignment '{}' at {}: {}",
                        record.assignment_name, record.scope, detail
                    )
                }
            }
            report.outcomes.push(CandidateOutcome { record, outcome });
        }

        if self.config.what_if {
            info!(
                "dry run complete: {} would be removed, {} skipped, {} failed",
                report.would_remove(),
                report.skipped(),
                report.failed()
            );
        } else {
            info!(
                "removal run complete: {} removed, {} skipped, {} failed",
                report.removed(),
                report.skipped(),
                report.failed()
            );
        }
        Ok(report)
    }

    async fn process(&self, record: &AssignmentRecord) -> RemovalOutcome {
        // the scan-time result is never reused: both checks are live, which
        // closes the race window between scan, review, and removal
        match self.session.directory().exists(&record.principal_id).await {
            Ok(true) => return RemovalOutcome::Skipped(SkipReason::PrincipalExistsNow),
            Ok(false) => {}
            Err(e) => {
                warn!("re-verification of principal '{}' failed: {}", record.principal_id, e);
                return RemovalOutcome::Skipped(SkipReason::VerificationError);
            }
        }

        let listed = match self.session.assignments().list(&record.scope).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("re-listing scope '{}' failed: {}", record.scope, e);
                return RemovalOutcome::Skipped(SkipReason::VerificationError);
            }
        };
        let still_present = listed.iter().any(|a| {
            a.role_definition_id == record.role_definition_id
                && a.principal_id == record.principal_id
                && a.scope == record.scope
        });
        if !still_present {
            return RemovalOutcome::Skipped(SkipReason::AssignmentGone);
        }

        if let Some(outcome) = self.evaluate_guardrail(record, &listed) {
            return outcome;
        }

        if self.config.what_if {
            return RemovalOutcome::WouldRemove;
        }

        // delete by the exact recorded triple, never by a fresh listing, so
        // a same-named assignment created in the interim is untouchable
        match self
            .session
            .assignments()
            .delete(&record.role_definition_id, &record.principal_id, &record.scope)
            .await
        {
            Ok(DeleteOutcome::Deleted) => RemovalOutcome::Removed,
            Ok(DeleteOutcome::PreconditionFailed) => {
                RemovalOutcome::Skipped(SkipReason::PreconditionFailed)
            }
            Err(e) => RemovalOutcome::Failed(e.to_string()),
        }
    }

    /// Single guardrail evaluation, run once before any deletion
    ///
    /// Applies only to administrative roles attached exactly at a
    /// subscription root. The count is taken live from the re-listing made
    /// during verification, restricted to directly-attached assignments:
    /// inherited grants do not keep a subscription manageable on their own
    /// after tenant-level changes, so they never count toward the floor.
    fn evaluate_guardrail(
        &self,
        record: &AssignmentRecord,
        listed: &[crate::provider::ProviderAssignment],
    ) -> Option<RemovalOutcome> {
        if !self.config.is_admin_role(&record.role_definition_name) {
            return None;
        }
        if !scope::is_subscription_root(&record.scope) {
            return None;
        }

        let admin_count = listed
            .iter()
            .filter(|a| a.scope == record.scope)
            .filter(|a| self.config.is_admin_role(&a.role_definition_name))
            .count();
        if admin_count <= 1 {
            warn!(
                "guardrail: '{}' is the last administrative assignment at {}, needs manual remediation",
                record.assignment_name, record.scope
            );
            return Some(RemovalOutcome::Skipped(SkipReason::GuardrailLastAdmin));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_distinct() {
        let reasons = [
            SkipReason::PrincipalExistsNow,
            SkipReason::AssignmentGone,
            SkipReason::GuardrailLastAdmin,
            SkipReason::PreconditionFailed,
            SkipReason::VerificationError,
        ];
        let codes: std::collections::HashSet<&str> = reasons.iter().map(|r| r.code()).collect();
        assert_eq!(codes.len(), reasons.len());
    }

    #[test]
    fn test_report_counters() {
        let record = AssignmentRecord {
            assignment_name: "ra".to_string(),
            assignment_id: "id".to_string(),
            scope: "/subscriptions/x".to_string(),
            role_definition_name: "Owner".to_string(),
            role_definition_id: "rd".to_string(),
            principal_id: "p".to_string(),
            principal_type: "Unknown".to_string(),
            target_type: crate::model::TargetType::Subscription,
            target_name: "t".to_string(),
        };
        let mut report = RemovalReport::default();
        for outcome in [
            RemovalOutcome::Removed,
            RemovalOutcome::Skipped(SkipReason::GuardrailLastAdmin),
            RemovalOutcome::Skipped(SkipReason::AssignmentGone),
            RemovalOutcome::Failed("boom".to_string()),
        ] {
            report.outcomes.push(CandidateOutcome {
                record: record.clone(),
                outcome,
            });
        }

        assert_eq!(report.removed(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
        let counts = report.counts_by_code();
        assert_eq!(counts["removed"], 1);
        assert_eq!(counts["guardrail-last-admin"], 1);
        assert_eq!(counts["other-error"], 1);
    }
}
