//! REST-backed provider implementations
//!
//! Thin transports behind the core trait seams. Tokens are expected to be
//! pre-acquired (credential acquisition is not this tool's job) and are read
//! from the environment at session construction; a missing token is a fatal
//! setup error, never a per-scope one.
//!
//! Status mapping is the contract that keeps the core honest: the directory
//! returns `Ok(false)` only for a definitive not-found, and every other
//! failure stays an error.

use crate::config::CliConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use rolesweep_core::error::{SweepError, SweepResult};
use rolesweep_core::provider::{
    AssignmentService, DeleteOutcome, DirectoryService, HierarchyNode, HierarchyService,
    ProviderAssignment, SweepSession,
};

const CONTROL_TOKEN_VAR: &str = "ROLESWEEP_CONTROL_TOKEN";
const DIRECTORY_TOKEN_VAR: &str = "ROLESWEEP_DIRECTORY_TOKEN";

/// Build an authenticated session from config and environment tokens
pub fn build_session(config: &CliConfig) -> Result<SweepSession> {
    let control_token = require_token(CONTROL_TOKEN_VAR)?;
    let directory_token = require_token(DIRECTORY_TOKEN_VAR)?;
    let client = reqwest::Client::new();

    let control_plane = Arc::new(RestControlPlane {
        client: client.clone(),
        base_url: config.control_plane_url.trim_end_matches('/').to_string(),
        token: control_token,
    });
    let directory = Arc::new(RestDirectory {
        client,
        base_url: config.directory_url.trim_end_matches('/').to_string(),
        token: directory_token,
    });

    Ok(SweepSession::new(directory, control_plane.clone(), control_plane))
}

fn require_token(var: &str) -> SweepResult<String> {
    std::env::var(var)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| SweepError::Auth(format!("{var} is not set")))
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationStatus {
    registered: bool,
}

/// Control-plane client covering assignments and the hierarchy
pub struct RestControlPlane {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestControlPlane {
    fn provider_error(&self, scope: &str, detail: impl std::fmt::Display) -> SweepError {
        SweepError::Provider {
            scope: scope.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl AssignmentService for RestControlPlane {
    async fn list(&self, scope: &str) -> SweepResult<Vec<ProviderAssignment>> {
        let response = self
            .client
            .get(format!("{}/assignments", self.base_url))
            .query(&[("scope", scope)])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.provider_error(scope, e))?;
        if !response.status().is_success() {
            return Err(self.provider_error(scope, format!("listing returned {}", response.status())));
        }
        response
            .json::<Vec<ProviderAssignment>>()
            .await
            .map_err(|e| self.provider_error(scope, e))
    }

    async fn list_resource_groups(&self, subscription_id: &str) -> SweepResult<Vec<String>> {
        let scope = format!("/subscriptions/{subscription_id}");
        let response = self
            .client
            .get(format!(
                "{}/subscriptions/{subscription_id}/resourceGroups",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.provider_error(&scope, e))?;
        if !response.status().is_success() {
            return Err(
                self.provider_error(&scope, format!("enumeration returned {}", response.status()))
            );
        }
        let groups = response
            .json::<Vec<NamedItem>>()
            .await
            .map_err(|e| self.provider_error(&scope, e))?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    async fn delete(
        &self,
        role_definition_id: &str,
        principal_id: &str,
        scope: &str,
    ) -> SweepResult<DeleteOutcome> {
        let response = self
            .client
            .delete(format!("{}/assignments", self.base_url))
            .query(&[
                ("roleDefinitionId", role_definition_id),
                ("principalId", principal_id),
                ("scope", scope),
            ])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.provider_error(scope, e))?;
        match response.status() {
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            // gone or changed underneath us; the engine skips, not fails
            StatusCode::NOT_FOUND | StatusCode::PRECONDITION_FAILED => {
                Ok(DeleteOutcome::PreconditionFailed)
            }
            status => Err(self.provider_error(scope, format!("delete returned {status}"))),
        }
    }
}

#[async_trait]
impl HierarchyService for RestControlPlane {
    async fn ensure_registered(&self) -> SweepResult<()> {
        let response = self
            .client
            .get(format!("{}/providers/hierarchy", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SweepError::ProviderRegistration(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SweepError::ProviderRegistration(format!(
                "registration check returned {}",
                response.status()
            )));
        }
        let status = response
            .json::<RegistrationStatus>()
            .await
            .map_err(|e| SweepError::ProviderRegistration(e.to_string()))?;
        if status.registered {
            Ok(())
        } else {
            Err(SweepError::ProviderRegistration(
                "hierarchy enumeration provider is not registered".to_string(),
            ))
        }
    }

    async fn default_root(&self) -> SweepResult<String> {
        let response = self
            .client
            .get(format!("{}/hierarchy/root", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.provider_error("hierarchy-root", e))?;
        if !response.status().is_success() {
            return Err(
                self.provider_error("hierarchy-root", format!("lookup returned {}", response.status()))
            );
        }
        let root = response
            .json::<NamedItem>()
            .await
            .map_err(|e| self.provider_error("hierarchy-root", e))?;
        Ok(root.name)
    }

    async fn get_node(&self, name: &str, expand: bool) -> SweepResult<HierarchyNode> {
        let response = self
            .client
            .get(format!("{}/hierarchy/{name}", self.base_url))
            .query(&[("expand", if expand { "true" } else { "false" })])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.provider_error(name, e))?;
        if !response.status().is_success() {
            return Err(self.provider_error(name, format!("lookup returned {}", response.status())));
        }
        response
            .json::<HierarchyNode>()
            .await
            .map_err(|e| self.provider_error(name, e))
    }
}

/// Directory service client for principal existence checks
pub struct RestDirectory {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[async_trait]
impl DirectoryService for RestDirectory {
    async fn exists(&self, principal_id: &str) -> SweepResult<bool> {
        let directory_error = |detail: String| SweepError::Directory {
            principal_id: principal_id.to_string(),
            detail,
        };
        let response = self
            .client
            .get(format!("{}/principals/{principal_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| directory_error(e.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            // the only status that confirms absence; anything else is a
            // failed lookup and must not read as "orphaned"
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(directory_error(format!("lookup returned {status}"))),
        }
    }
}
