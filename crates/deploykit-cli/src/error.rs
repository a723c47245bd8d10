//! CLI error type with exit code handling (spec §6, §7).

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// Maps every error this CLI can surface onto an exit code, wrapping the
/// four core error kinds (spec §7) plus CLI-local usage errors.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("configuration error(s):\n{}", .errors.join("\n"))]
    #[diagnostic(code(deploykit::cli::configuration))]
    Configuration { errors: Vec<String> },

    #[error("invalid template(s):\n{}", .errors.join("\n"))]
    #[diagnostic(code(deploykit::cli::template))]
    Template { errors: Vec<String> },

    #[error("{message}")]
    #[diagnostic(code(deploykit::cli::deployment))]
    Deployment { message: String },

    #[error("deploy timed out after {elapsed_seconds}s waiting for: {}", .pending.join(", "))]
    #[diagnostic(code(deploykit::cli::timeout))]
    Timeout {
        elapsed_seconds: u64,
        pending: Vec<String>,
    },

    #[error("invalid argument: {message}")]
    #[diagnostic(code(deploykit::cli::usage))]
    Usage { message: String },

    #[error("Kubernetes client error: {0}")]
    #[diagnostic(code(deploykit::cli::kube))]
    Kube(#[from] kube::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Configuration { .. } => exit_codes::CONFIGURATION_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Deployment { .. } => exit_codes::DEPLOYMENT_ERROR,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Kube(_) => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

impl From<deploykit_kube::DeployError> for CliError {
    fn from(err: deploykit_kube::DeployError) -> Self {
        use deploykit_kube::DeployError as E;
        match err {
            E::TaskConfigurationError { errors } => CliError::Configuration { errors },
            E::InvalidTemplateError { errors } => CliError::Template { errors },
            E::FatalDeploymentError { message } => CliError::Deployment { message },
            E::DeploymentTimeoutError {
                elapsed_seconds,
                pending,
            } => CliError::Timeout {
                elapsed_seconds,
                pending,
            },
            E::Api(e) => CliError::Deployment {
                message: format!("Kubernetes API error: {e}"),
            },
            E::Core(e) => CliError::Template {
                errors: vec![e.to_string()],
            },
            E::Io(e) => CliError::Deployment {
                message: format!("IO error: {e}"),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
