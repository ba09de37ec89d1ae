//! Configuration management for the rolesweep CLI

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration, merged under any command-line flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Resource control plane base URL
    pub control_plane_url: String,

    /// Directory service base URL
    pub directory_url: String,

    /// Default maximum concurrent subscription scans
    pub max_parallel: usize,

    /// Subscription ids that are never scanned
    pub excluded_subscriptions: Vec<String>,

    /// Administrative role names protected by the removal guardrail
    pub admin_roles: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            control_plane_url: "http://localhost:8080".to_string(),
            directory_url: "http://localhost:8081".to_string(),
            max_parallel: 4,
            excluded_subscriptions: Vec::new(),
            admin_roles: vec![
                "Owner".to_string(),
                "User Access Administrator".to_string(),
            ],
        }
    }
}

impl CliConfig {
    /// Load configuration from an explicit path, or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Get the default config path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rolesweep").join("config.toml"))
    }
}
