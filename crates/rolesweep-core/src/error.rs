//! Error types for the sweep core

use thiserror::Error;

/// Sweep error types
#[derive(Debug, Error)]
pub enum SweepError {
    /// Hierarchy enumeration prerequisite is not provisioned
    #[error("hierarchy provider not registered: {0}")]
    ProviderRegistration(String),

    /// The traversal root could not be resolved
    #[error("hierarchy root '{root}' could not be resolved: {reason}")]
    RootUnresolvable { root: String, reason: String },

    /// Authenticated sessions to the backing services are unavailable
    #[error("authentication unavailable: {0}")]
    Auth(String),

    /// A control-plane call failed for one scope
    #[error("provider error at scope '{scope}': {detail}")]
    Provider { scope: String, detail: String },

    /// A directory lookup failed; distinct from a definitive not-found
    #[error("directory lookup failed for principal '{principal_id}': {detail}")]
    Directory {
        principal_id: String,
        detail: String,
    },

    /// Candidate artifact could not be written, read, or validated
    #[error("candidate artifact error: {0}")]
    Artifact(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SweepError {
    /// Whether this error aborts the whole run rather than one scope
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SweepError::ProviderRegistration(_)
                | SweepError::RootUnresolvable { .. }
                | SweepError::Auth(_)
                | SweepError::Config(_)
        )
    }
}

/// Sweep result type
pub type SweepResult<T> = std::result::Result<T, SweepError>;
