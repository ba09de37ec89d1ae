//! Mock providers for integration tests
//!
//! Configurable stand-ins for the directory and control-plane services:
//! behavior is set per scope or per principal, calls are recorded, and
//! failures can be injected without any network in the loop.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use rolesweep_core::error::{SweepError, SweepResult};
use rolesweep_core::provider::{
    AssignmentService, ChildKind, DeleteOutcome, DirectoryService, HierarchyChild, HierarchyNode,
    HierarchyService, ProviderAssignment, SweepSession,
};

/// Directory stub with a fixed set of existing principals and optional
/// lookup failures
#[derive(Default)]
pub struct MockDirectory {
    existing: RwLock<HashSet<String>>,
    erroring: RwLock<HashSet<String>>,
    lookups: AtomicU32,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(principals: &[&str]) -> Self {
        Self {
            existing: RwLock::new(principals.iter().map(|p| p.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Add a principal, e.g. to model one being recreated after the scan
    pub async fn add_existing(&self, principal_id: &str) {
        self.existing.write().await.insert(principal_id.to_string());
    }

    /// Make lookups for this principal fail instead of answering
    pub async fn fail_for(&self, principal_id: &str) {
        self.erroring.write().await.insert(principal_id.to_string());
    }

    pub fn lookup_count(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryService for MockDirectory {
    async fn exists(&self, principal_id: &str) -> SweepResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.erroring.read().await.contains(principal_id) {
            return Err(SweepError::Directory {
                principal_id: principal_id.to_string(),
                detail: "simulated lookup failure".to_string(),
            });
        }
        Ok(self.existing.read().await.contains(principal_id))
    }
}

/// Control-plane stub: assignments keyed by scope, with injectable listing
/// and deletion failures, and a record of every delete issued
#[derive(Default)]
pub struct MockAssignments {
    by_scope: RwLock<HashMap<String, Vec<ProviderAssignment>>>,
    resource_groups: RwLock<HashMap<String, Vec<String>>>,
    failing_scopes: RwLock<HashSet<String>>,
    precondition_deletes: RwLock<HashSet<String>>,
    failing_deletes: RwLock<HashSet<String>>,
    deleted: RwLock<Vec<(String, String, String)>>,
}

impl MockAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, assignment: ProviderAssignment) {
        self.by_scope
            .write()
            .await
            .entry(assignment.scope.clone())
            .or_default()
            .push(assignment);
    }

    pub async fn set_resource_groups(&self, subscription_id: &str, groups: &[&str]) {
        self.resource_groups.write().await.insert(
            subscription_id.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
    }

    /// Make listings at this scope fail
    pub async fn fail_scope(&self, scope: &str) {
        self.failing_scopes.write().await.insert(scope.to_string());
    }

    /// Make the delete of this principal's assignment report a precondition
    /// failure
    pub async fn precondition_on_delete(&self, principal_id: &str) {
        self.precondition_deletes
            .write()
            .await
            .insert(principal_id.to_string());
    }

    /// Make the delete of this principal's assignment error out
    pub async fn fail_delete(&self, principal_id: &str) {
        self.failing_deletes
            .write()
            .await
            .insert(principal_id.to_string());
    }

    /// Every (role definition, principal, scope) triple deleted so far
    pub async fn deleted(&self) -> Vec<(String, String, String)> {
        self.deleted.read().await.clone()
    }
}

#[async_trait]
impl AssignmentService for MockAssignments {
    async fn list(&self, scope: &str) -> SweepResult<Vec<ProviderAssignment>> {
        if self.failing_scopes.read().await.contains(scope) {
            return Err(SweepError::Provider {
                scope: scope.to_string(),
                detail: "simulated listing failure".to_string(),
            });
        }
        Ok(self
            .by_scope
            .read()
            .await
            .get(scope)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_resource_groups(&self, subscription_id: &str) -> SweepResult<Vec<String>> {
        Ok(self
            .resource_groups
            .read()
            .await
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(
        &self,
        role_definition_id: &str,
        principal_id: &str,
        scope: &str,
    ) -> SweepResult<DeleteOutcome> {
        if self.failing_deletes.read().await.contains(principal_id) {
            return Err(SweepError::Provider {
                scope: scope.to_string(),
                detail: "simulated delete failure".to_string(),
            });
        }
        if self.precondition_deletes.read().await.contains(principal_id) {
            return Ok(DeleteOutcome::PreconditionFailed);
        }
        self.deleted.write().await.push((
            role_definition_id.to_string(),
            principal_id.to_string(),
            scope.to_string(),
        ));
        self.by_scope
            .write()
            .await
            .entry(scope.to_string())
            .or_default()
            .retain(|a| {
                !(a.role_definition_id == role_definition_id && a.principal_id == principal_id)
            });
        Ok(DeleteOutcome::Deleted)
    }
}

/// Hierarchy stub serving a fixed node map
pub struct MockHierarchy {
    nodes: RwLock<HashMap<String, HierarchyNode>>,
    root: String,
    registered: bool,
}

impl MockHierarchy {
    /// A registered hierarchy with a childless root node
    pub fn with_root(root: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root.to_string(),
            HierarchyNode {
                name: root.to_string(),
                display_name: root.to_string(),
                children: Vec::new(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            root: root.to_string(),
            registered: true,
        }
    }

    /// A hierarchy whose enumeration prerequisite is missing
    pub fn unregistered(root: &str) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            root: root.to_string(),
            registered: false,
        }
    }

    pub async fn insert_node(&self, node: HierarchyNode) {
        self.nodes.write().await.insert(node.name.clone(), node);
    }
}

#[async_trait]
impl HierarchyService for MockHierarchy {
    async fn ensure_registered(&self) -> SweepResult<()> {
        if self.registered {
            Ok(())
        } else {
            Err(SweepError::ProviderRegistration(
                "hierarchy enumeration provider is not registered".to_string(),
            ))
        }
    }

    async fn default_root(&self) -> SweepResult<String> {
        Ok(self.root.clone())
    }

    async fn get_node(&self, name: &str, _expand: bool) -> SweepResult<HierarchyNode> {
        self.nodes
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SweepError::Provider {
                scope: name.to_string(),
                detail: "node not found".to_string(),
            })
    }
}

pub fn session(
    directory: Arc<MockDirectory>,
    assignments: Arc<MockAssignments>,
    hierarchy: Arc<MockHierarchy>,
) -> SweepSession {
    SweepSession::new(directory, assignments, hierarchy)
}

pub fn group_child(name: &str) -> HierarchyChild {
    HierarchyChild {
        kind: ChildKind::ManagementGroup,
        name: name.to_string(),
        display_name: name.to_uppercase(),
        children: None,
    }
}

pub fn group_node(name: &str, children: Vec<HierarchyChild>) -> HierarchyNode {
    HierarchyNode {
        name: name.to_string(),
        display_name: name.to_uppercase(),
        children,
    }
}

pub fn assignment(name: &str, role: &str, principal_id: &str, scope: &str) -> ProviderAssignment {
    ProviderAssignment {
        assignment_id: format!("{scope}/roleAssignments/{name}"),
        assignment_name: name.to_string(),
        scope: scope.to_string(),
        role_definition_id: format!("/roleDefinitions/{}", role.to_lowercase().replace(' ', "-")),
        role_definition_name: role.to_string(),
        principal_id: principal_id.to_string(),
    }
}
