//! Provider boundary abstraction layer
//!
//! This module defines the seams between the sweep core and the two backing
//! services: the resource control plane (assignments, hierarchy) and the
//! directory service (principal existence). Transports and credential
//! handling live behind these traits; the core never talks to the network
//! directly.

use crate::error::SweepResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One assignment as the control plane reports it, before verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAssignment {
    pub assignment_id: String,
    pub assignment_name: String,
    /// Attachment scope; differs from the queried scope for inherited grants
    pub scope: String,
    pub role_definition_id: String,
    pub role_definition_name: String,
    pub principal_id: String,
}

/// Result of a delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The assignment was deleted
    Deleted,
    /// The assignment was concurrently modified or already gone
    PreconditionFailed,
}

/// Declared kind of a hierarchy child
///
/// Only `ManagementGroup` children are descended into; anything else is left
/// to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildKind {
    ManagementGroup,
    Subscription,
    #[serde(other)]
    Other,
}

/// Child stub as reported inside a hierarchy node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyChild {
    pub kind: ChildKind,
    pub name: String,
    pub display_name: String,
    /// Inline nested data; `None` means the provider returned a shallow stub
    /// and the child must be fetched explicitly before descending
    #[serde(default)]
    pub children: Option<Vec<HierarchyChild>>,
}

/// A hierarchy node with its immediate children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub children: Vec<HierarchyChild>,
}

/// Principal existence queries against the directory service
///
/// An `Err` is a failed lookup and MUST stay distinct from `Ok(false)`;
/// collapsing the two would let a flaky directory flag live principals as
/// orphaned.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Whether the principal currently exists in the directory
    async fn exists(&self, principal_id: &str) -> SweepResult<bool>;
}

/// Assignment listing and removal against the control plane
#[async_trait]
pub trait AssignmentService: Send + Sync {
    /// All assignments visible at the scope, inherited ones included
    async fn list(&self, scope: &str) -> SweepResult<Vec<ProviderAssignment>>;

    /// Names of the resource groups directly under a subscription
    async fn list_resource_groups(&self, subscription_id: &str) -> SweepResult<Vec<String>>;

    /// Delete the assignment identified by the exact triple
    async fn delete(
        &self,
        role_definition_id: &str,
        principal_id: &str,
        scope: &str,
    ) -> SweepResult<DeleteOutcome>;
}

/// Hierarchy enumeration against the control plane
#[async_trait]
pub trait HierarchyService: Send + Sync {
    /// Fail unless the hierarchy enumeration prerequisite is provisioned
    async fn ensure_registered(&self) -> SweepResult<()>;

    /// Name of the tenant-equivalent root node
    async fn default_root(&self) -> SweepResult<String>;

    /// Fetch one node; `expand` requests inline child data
    async fn get_node(&self, name: &str, expand: bool) -> SweepResult<HierarchyNode>;
}

/// Explicit session context passed to every component call
///
/// Replaces any global "current session" notion: provider handles are
/// acquired once per run and shared read-only, so concurrent scan workers
/// never interfere through hidden state.
#[derive(Clone)]
pub struct SweepSession {
    directory: Arc<dyn DirectoryService>,
    assignments: Arc<dyn AssignmentService>,
    hierarchy: Arc<dyn HierarchyService>,
}

impl SweepSession {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        assignments: Arc<dyn AssignmentService>,
        hierarchy: Arc<dyn HierarchyService>,
    ) -> Self {
        Self {
            directory,
            assignments,
            hierarchy,
        }
    }

    pub fn directory(&self) -> &dyn DirectoryService {
        self.directory.as_ref()
    }

    pub fn assignments(&self) -> &dyn AssignmentService {
        self.assignments.as_ref()
    }

    pub fn hierarchy(&self) -> &dyn HierarchyService {
        self.hierarchy.as_ref()
    }
}

impl std::fmt::Debug for SweepSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepSession").finish_non_exhaustive()
    }
}
