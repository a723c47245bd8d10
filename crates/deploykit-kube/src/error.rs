//! Error types for deploykit-kube, mapping directly onto the four error
//! kinds named in spec §7.

use thiserror::Error;

/// Result type for deploykit-kube operations.
pub type Result<T> = std::result::Result<T, DeployError>;

/// The four fatal-error kinds a deploy task can raise (spec §7). Every
/// phase method either returns normally or raises one of these; the
/// orchestrator is the only place that catches them.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Pre-flight checks failed. Errors accumulate (not short-circuit); see
    /// `ConfigValidator` (spec §4.3).
    #[error("configuration error(s):\n{}", .errors.join("\n"))]
    TaskConfigurationError { errors: Vec<String> },

    /// A template failed to parse or validate, classified per file and
    /// surfaced as a single fatal error (spec §4.1, §7).
    #[error("invalid template(s):\n{}", .errors.join("\n"))]
    InvalidTemplateError { errors: Vec<String> },

    /// Any apply/replace/create failure, or a `deploy_failed?` resource
    /// after verify (spec §4.6, §7).
    #[error("{message}")]
    FatalDeploymentError { message: String },

    /// The watcher's global deadline elapsed and every non-succeeded
    /// resource is timed out, with no hard failures (spec §4.7, §7, §4.8).
    #[error("deploy timed out after {elapsed_seconds}s waiting for: {}", .pending.join(", "))]
    DeploymentTimeoutError {
        elapsed_seconds: u64,
        pending: Vec<String>,
    },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error(transparent)]
    Core(#[from] deploykit_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::FatalDeploymentError {
            message: message.into(),
        }
    }

    /// `Deploying namespaced resource is not allowed from this command.`
    /// (spec §8 scenario 6, verbatim wording — tests depend on it).
    pub fn namespaced_resource_rejected() -> Self {
        Self::FatalDeploymentError {
            message: "Deploying namespaced resource is not allowed from this command.".to_string(),
        }
    }
}
