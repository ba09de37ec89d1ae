//! Hierarchy traversal
//!
//! Flattens the management-group topology under a root node into an ordered
//! list of [`ScopeNode`]s. The traversal is an explicit-stack DFS rather
//! than call-stack recursion, so hierarchy depth never threatens the stack,
//! and a visited-name set makes cyclic or repeated child references
//! terminate instead of looping.

use crate::error::{SweepError, SweepResult};
use crate::model::ScopeNode;
use crate::provider::{ChildKind, HierarchyChild, SweepSession};
use std::collections::HashSet;
use tracing::{debug, warn};

struct PendingNode {
    name: String,
    display_name: String,
    parent_name: Option<String>,
    parent_path: Option<String>,
    level: u32,
    /// Inline child data when the provider expanded the node; `None` forces
    /// an explicit fetch before descending
    children: Option<Vec<HierarchyChild>>,
}

/// Walk the hierarchy under `root` and return every reachable
/// management-group node, parents strictly before children.
///
/// The result is sorted by `(level, path)`, which downstream scanning relies
/// on for a deterministic, auditable order. Root resolution failure and a
/// missing provider registration are fatal; a failed child fetch only drops
/// that branch.
pub async fn walk(session: &SweepSession, root: Option<&str>) -> SweepResult<Vec<ScopeNode>> {
    session.hierarchy().ensure_registered().await?;

    let root_name = match root {
        Some(name) => name.to_string(),
        None => session.hierarchy().default_root().await?,
    };

    let root_node = session
        .hierarchy()
        .get_node(&root_name, true)
        .await
        .map_err(|e| SweepError::RootUnresolvable {
            root: root_name.clone(),
            reason: e.to_string(),
        })?;

    let mut visited: HashSet<String> = HashSet::new();
    let mut nodes: Vec<ScopeNode> = Vec::new();
    let mut stack: Vec<PendingNode> = vec![PendingNode {
        name: root_node.name,
        display_name: root_node.display_name,
        parent_name: None,
        parent_path: None,
        level: 0,
        children: Some(root_node.children),
    }];

    while let Some(pending) = stack.pop() {
        if !visited.insert(pending.name.clone()) {
            debug!(name = %pending.name, "skipping already visited node");
            continue;
        }

        let path = match &pending.parent_path {
            Some(parent_path) => format!("{parent_path}/{}", pending.name),
            None => pending.name.clone(),
        };

        let children = match pending.children {
            Some(children) => children,
            None => match session.hierarchy().get_node(&pending.name, true).await {
                Ok(node) => node.children,
                Err(e) => {
                    warn!(name = %pending.name, error = %e, "failed to expand node, dropping branch");
                    nodes.push(ScopeNode {
                        name: pending.name,
                        display_name: pending.display_name,
                        parent_name: pending.parent_name,
                        level: pending.level,
                        path,
                    });
                    continue;
                }
            },
        };

        for child in children {
            if child.kind != ChildKind::ManagementGroup {
                continue;
            }
            if visited.contains(&child.name) {
                continue;
            }
            stack.push(PendingNode {
                name: child.name,
                display_name: child.display_name,
                parent_name: Some(pending.name.clone()),
                parent_path: Some(path.clone()),
                level: pending.level + 1,
                children: child.children,
            });
        }

        nodes.push(ScopeNode {
            name: pending.name,
            display_name: pending.display_name,
            parent_name: pending.parent_name,
            level: pending.level,
            path,
        });
    }

    nodes.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.path.cmp(&b.path)));
    debug!(count = nodes.len(), "hierarchy traversal complete");
    Ok(nodes)
}
