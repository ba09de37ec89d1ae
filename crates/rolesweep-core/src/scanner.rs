//! Per-scope orphan scanning
//!
//! Composes the assignment listing with directory verification for one
//! scope at a time. Read-only by construction; running many scanners
//! concurrently is safe because nothing here mutates provider state.

use crate::error::SweepResult;
use crate::model::{scope, AssignmentRecord, TargetType, PRINCIPAL_TYPE_UNKNOWN};
use crate::provider::{ProviderAssignment, SweepSession};
use tracing::{debug, info, warn};

/// Records and counters from scanning one target (plus any recursed
/// resource groups)
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub records: Vec<AssignmentRecord>,
    /// Principals whose lookup errored; skipped, never flagged
    pub verification_errors: usize,
    /// Child scopes that failed to list and contributed nothing
    pub failed_scopes: usize,
}

/// Scans scopes for assignments whose principal no longer resolves
pub struct OrphanScanner {
    session: SweepSession,
}

impl OrphanScanner {
    pub fn new(session: SweepSession) -> Self {
        Self { session }
    }

    /// Scan a subscription scope, optionally recursing into each resource
    /// group under it
    pub async fn scan_subscription(
        &self,
        subscription_id: &str,
        include_resource_groups: bool,
    ) -> SweepResult<ScanOutput> {
        let mut output = ScanOutput::default();
        self.scan_scope(
            TargetType::Subscription,
            &scope::subscription(subscription_id),
            subscription_id,
            &mut output,
        )
        .await?;

        if include_resource_groups {
            let groups = self
                .session
                .assignments()
                .list_resource_groups(subscription_id)
                .await?;
            for group in groups {
                let group_scope = scope::resource_group(subscription_id, &group);
                // one resource group failing to list must not sink the
                // subscription's own findings
                if let Err(e) = self
                    .scan_scope(TargetType::ResourceGroup, &group_scope, &group, &mut output)
                    .await
                {
                    warn!("resource group '{}' scan failed: {}", group, e);
                    output.failed_scopes += 1;
                }
            }
        }

        Ok(output)
    }

    /// Scan one management-group scope
    pub async fn scan_management_group(
        &self,
        name: &str,
        display_name: &str,
    ) -> SweepResult<ScanOutput> {
        let mut output = ScanOutput::default();
        self.scan_scope(
            TargetType::ManagementGroup,
            &scope::management_group(name),
            display_name,
            &mut output,
        )
        .await?;
        Ok(output)
    }

    /// Scan one resource group scope directly
    pub async fn scan_resource_group(
        &self,
        subscription_id: &str,
        group: &str,
    ) -> SweepResult<ScanOutput> {
        let mut output = ScanOutput::default();
        self.scan_scope(
            TargetType::ResourceGroup,
            &scope::resource_group(subscription_id, group),
            group,
            &mut output,
        )
        .await?;
        Ok(output)
    }

    async fn scan_scope(
        &self,
        target_type: TargetType,
        scope: &str,
        target_name: &str,
        output: &mut ScanOutput,
    ) -> SweepResult<()> {
        let assignments = self.session.assignments().list(scope).await?;
        debug!(
            "listed {} assignments at {} '{}'",
            assignments.len(),
            target_type,
            target_name
        );

        let mut orphaned = 0usize;
        for assignment in assignments {
            match self.session.directory().exists(&assignment.principal_id).await {
                Ok(true) => {}
                Ok(false) => {
                    orphaned += 1;
                    output
                        .records
                        .push(orphan_record(assignment, target_type, target_name));
                }
                Err(e) => {
                    // a failed lookup is ambiguity, not evidence of an orphan
                    warn!(
                        "could not verify principal '{}' at {}: {}",
                        assignment.principal_id, scope, e
                    );
                    output.verification_errors += 1;
                }
            }
        }

        if orphaned > 0 {
            info!("{} orphaned assignment(s) at {} '{}'", orphaned, target_type, target_name);
        }
        Ok(())
    }
}

fn orphan_record(
    assignment: ProviderAssignment,
    target_type: TargetType,
    target_name: &str,
) -> AssignmentRecord {
    AssignmentRecord {
        assignment_name: assignment.assignment_name,
        assignment_id: assignment.assignment_id,
        scope: assignment.scope,
        role_definition_name: assignment.role_definition_name,
        role_definition_id: assignment.role_definition_id,
        principal_id: assignment.principal_id,
        principal_type: PRINCIPAL_TYPE_UNKNOWN.to_string(),
        target_type,
        target_name: target_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SweepError;
    use crate::provider::{
        AssignmentService, DeleteOutcome, DirectoryService, HierarchyNode, HierarchyService,
    };
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    struct FixedDirectory {
        existing: HashSet<String>,
        erroring: HashSet<String>,
    }

    #[async_trait]
    impl DirectoryService for FixedDirectory {
        async fn exists(&self, principal_id: &str) -> SweepResult<bool> {
            if self.erroring.contains(principal_id) {
                return Err(SweepError::Directory {
                    principal_id: principal_id.to_string(),
                    detail: "lookup timed out".to_string(),
                });
            }
            Ok(self.existing.contains(principal_id))
        }
    }

    struct FixedAssignments {
        by_scope: HashMap<String, Vec<ProviderAssignment>>,
        resource_groups: Vec<String>,
    }

    #[async_trait]
    impl AssignmentService for FixedAssignments {
        async fn list(&self, scope: &str) -> SweepResult<Vec<ProviderAssignment>> {
            Ok(self.by_scope.get(scope).cloned().unwrap_or_default())
        }

        async fn list_resource_groups(&self, _subscription_id: &str) -> SweepResult<Vec<String>> {
            Ok(self.resource_groups.clone())
        }

        async fn delete(
            &self,
            _role_definition_id: &str,
            _principal_id: &str,
            _scope: &str,
        ) -> SweepResult<DeleteOutcome> {
            Ok(DeleteOutcome::Deleted)
        }
    }

    struct EmptyHierarchy;

    #[async_trait]
    impl HierarchyService for EmptyHierarchy {
        async fn ensure_registered(&self) -> SweepResult<()> {
            Ok(())
        }

        async fn default_root(&self) -> SweepResult<String> {
            Ok("root".to_string())
        }

        async fn get_node(&self, name: &str, _expand: bool) -> SweepResult<HierarchyNode> {
            Ok(HierarchyNode {
                name: name.to_string(),
                display_name: name.to_string(),
                children: Vec::new(),
            })
        }
    }

    const SUB: &str = "1f1a2b3c-0000-4000-8000-000000000001";

    fn assignment(name: &str, principal: &str, scope: &str) -> ProviderAssignment {
        ProviderAssignment {
            assignment_id: format!("{scope}/roleAssignments/{name}"),
            assignment_name: name.to_string(),
            scope: scope.to_string(),
            role_definition_id: "/roleDefinitions/reader".to_string(),
            role_definition_name: "Reader".to_string(),
            principal_id: principal.to_string(),
        }
    }

    fn scanner(
        existing: &[&str],
        erroring: &[&str],
        by_scope: HashMap<String, Vec<ProviderAssignment>>,
        resource_groups: Vec<String>,
    ) -> OrphanScanner {
        OrphanScanner::new(SweepSession::new(
            Arc::new(FixedDirectory {
                existing: existing.iter().map(|s| s.to_string()).collect(),
                erroring: erroring.iter().map(|s| s.to_string()).collect(),
            }),
            Arc::new(FixedAssignments {
                by_scope,
                resource_groups,
            }),
            Arc::new(EmptyHierarchy),
        ))
    }

    #[tokio::test]
    async fn test_live_principals_are_never_flagged() {
        let sub_scope = scope::subscription(SUB);
        let mut by_scope = HashMap::new();
        by_scope.insert(
            sub_scope.clone(),
            vec![
                assignment("ra-1", "p-live", &sub_scope),
                assignment("ra-2", "p-live-2", &sub_scope),
            ],
        );
        let scanner = scanner(&["p-live", "p-live-2"], &[], by_scope, vec![]);

        let output = scanner.scan_subscription(SUB, false).await.unwrap();
        assert!(output.records.is_empty());
        assert_eq!(output.verification_errors, 0);
    }

    #[tokio::test]
    async fn test_missing_principal_is_flagged_as_unknown() {
        let sub_scope = scope::subscription(SUB);
        let mut by_scope = HashMap::new();
        by_scope.insert(
            sub_scope.clone(),
            vec![assignment("ra-1", "p-gone", &sub_scope)],
        );
        let scanner = scanner(&[], &[], by_scope, vec![]);

        let output = scanner.scan_subscription(SUB, false).await.unwrap();
        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert_eq!(record.principal_id, "p-gone");
        assert_eq!(record.principal_type, PRINCIPAL_TYPE_UNKNOWN);
        assert_eq!(record.target_type, TargetType::Subscription);
        assert_eq!(record.target_name, SUB);
    }

    #[tokio::test]
    async fn test_verifier_error_is_skipped_not_flagged() {
        let sub_scope = scope::subscription(SUB);
        let mut by_scope = HashMap::new();
        by_scope.insert(
            sub_scope.clone(),
            vec![
                assignment("ra-1", "p-ambiguous", &sub_scope),
                assignment("ra-2", "p-gone", &sub_scope),
            ],
        );
        let scanner = scanner(&[], &["p-ambiguous"], by_scope, vec![]);

        let output = scanner.scan_subscription(SUB, false).await.unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].principal_id, "p-gone");
        assert_eq!(output.verification_errors, 1);
    }

    #[tokio::test]
    async fn test_resource_group_recursion_accumulates() {
        let sub_scope = scope::subscription(SUB);
        let rg_scope = scope::resource_group(SUB, "rg-app");
        let mut by_scope = HashMap::new();
        by_scope.insert(
            sub_scope.clone(),
            vec![assignment("ra-sub", "p-gone", &sub_scope)],
        );
        by_scope.insert(
            rg_scope.clone(),
            vec![assignment("ra-rg", "p-gone-2", &rg_scope)],
        );
        let scanner = scanner(&[], &[], by_scope, vec!["rg-app".to_string()]);

        let output = scanner.scan_subscription(SUB, true).await.unwrap();
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].target_type, TargetType::Subscription);
        assert_eq!(output.records[1].target_type, TargetType::ResourceGroup);
        assert_eq!(output.records[1].target_name, "rg-app");
    }
}
