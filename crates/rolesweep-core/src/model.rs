//! Value types shared across the scan and removal phases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Principal type recorded on a candidate before the directory can classify it
pub const PRINCIPAL_TYPE_UNKNOWN: &str = "Unknown";

/// Kind of scope a scan was pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    ManagementGroup,
    Subscription,
    ResourceGroup,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::ManagementGroup => write!(f, "ManagementGroup"),
            TargetType::Subscription => write!(f, "Subscription"),
            TargetType::ResourceGroup => write!(f, "ResourceGroup"),
        }
    }
}

/// One node of the resource hierarchy, flattened out of a traversal
///
/// Created once per traversal and never mutated. Every non-root node has a
/// parent that appears earlier in the traversal result at a strictly lower
/// level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeNode {
    /// Stable identifier, unique within one traversal
    pub name: String,
    /// Human-facing label
    pub display_name: String,
    /// Parent identifier; `None` only for the root
    pub parent_name: Option<String>,
    /// Depth from the root, root is 0
    pub level: u32,
    /// Slash-joined ancestor chain, root has `path == name`
    pub path: String,
}

/// One access-control grant flagged as orphaned
///
/// Serialized field names are the candidate artifact schema; the artifact is
/// reviewed by humans between the scan and removal phases, so the names stay
/// stable even where the Rust names differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "RoleAssignmentName")]
    pub assignment_name: String,
    /// Globally unique assignment identifier
    #[serde(rename = "RoleAssignmentId")]
    pub assignment_id: String,
    /// Scope the grant is attached to; may differ from the scanned scope
    /// when the assignment is inherited
    #[serde(rename = "Scope")]
    pub scope: String,
    #[serde(rename = "RoleDefinitionName")]
    pub role_definition_name: String,
    #[serde(rename = "RoleDefinitionId")]
    pub role_definition_id: String,
    /// Principal the grant refers to; resolved to not-found at scan time
    #[serde(rename = "ObjectId")]
    pub principal_id: String,
    #[serde(rename = "ObjectType")]
    pub principal_type: String,
    #[serde(rename = "TargetType")]
    pub target_type: TargetType,
    #[serde(rename = "TargetName")]
    pub target_name: String,
}

impl AssignmentRecord {
    /// Whether the record carries the identifiers the removal engine needs
    pub fn is_well_formed(&self) -> bool {
        !self.assignment_id.trim().is_empty()
            && !self.role_definition_id.trim().is_empty()
            && !self.principal_id.trim().is_empty()
            && !self.scope.trim().is_empty()
    }
}

/// Merged output of one scan run
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Candidate records; per-scope enumeration order is preserved
    pub records: Vec<AssignmentRecord>,
    /// Scopes that were scanned to completion
    pub scopes_scanned: usize,
    /// Scopes that failed to list or scan and contributed nothing
    pub scopes_failed: usize,
    /// Scopes abandoned because the time budget ran out
    pub scopes_skipped: usize,
    /// Principals whose directory lookup errored and were left unflagged
    pub verification_errors: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    /// A run with zero candidates and zero failures is a clean empty run
    pub fn is_clean(&self) -> bool {
        self.scopes_failed == 0 && self.scopes_skipped == 0 && self.verification_errors == 0
    }
}

/// Scope path construction and classification
pub mod scope {
    use super::Uuid;

    pub fn subscription(id: &str) -> String {
        format!("/subscriptions/{id}")
    }

    pub fn resource_group(subscription_id: &str, group: &str) -> String {
        format!("/subscriptions/{subscription_id}/resourceGroups/{group}")
    }

    pub fn management_group(name: &str) -> String {
        format!("/providers/managementGroups/{name}")
    }

    /// True only for an exact subscription root scope, never a descendant
    pub fn is_subscription_root(scope: &str) -> bool {
        scope
            .strip_prefix("/subscriptions/")
            .map(|rest| !rest.contains('/') && Uuid::parse_str(rest).is_ok())
            .unwrap_or(false)
    }
}
