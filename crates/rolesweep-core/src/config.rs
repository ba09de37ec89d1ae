//! Sweep run configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one scan or removal run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Candidate subscription ids for the parallel scan phase
    pub subscriptions: Vec<String>,

    /// Subscription ids that are never scanned
    pub excluded_subscriptions: Vec<String>,

    /// Hierarchy traversal root; the provider's default root when unset
    pub hierarchy_root: Option<String>,

    /// Maximum simultaneously in-flight subscription scans
    pub max_parallel: usize,

    /// Recurse into resource groups under each subscription
    pub include_resource_groups: bool,

    /// Role names whose subscription-scope assignments are guardrailed
    pub admin_roles: Vec<String>,

    /// Where the candidate artifact is written
    pub artifact_path: PathBuf,

    /// Scan time budget in seconds; scopes still unscanned at expiry are
    /// abandoned and the partial result is exported
    pub time_budget_secs: Option<u64>,

    /// Verify and report without deleting anything
    pub what_if: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            excluded_subscriptions: Vec::new(),
            hierarchy_root: None,
            max_parallel: 4,
            include_resource_groups: false,
            admin_roles: vec![
                "Owner".to_string(),
                "User Access Administrator".to_string(),
            ],
            artifact_path: PathBuf::from("orphaned-assignments.json"),
            time_budget_secs: None,
            what_if: false,
        }
    }
}

impl SweepConfig {
    /// Whether the role name is one of the designated administrative roles
    pub fn is_admin_role(&self, role_definition_name: &str) -> bool {
        self.admin_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(role_definition_name))
    }

    /// Whether the subscription id is on the exclusion list
    pub fn is_excluded(&self, subscription_id: &str) -> bool {
        self.excluded_subscriptions
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subscription_id))
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }
}
