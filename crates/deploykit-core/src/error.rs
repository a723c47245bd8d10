//! Error types shared by the template set and everything that consumes it.

use thiserror::Error;

/// Errors raised while discovering and parsing manifest templates.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to read template path '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A single YAML document failed to parse. Carries the file path and,
    /// when the document is not sensitive, a content snippet for diagnostics.
    #[error("invalid template in '{file}': {message}")]
    InvalidTemplate {
        file: String,
        message: String,
        snippet: Option<String>,
    },

    /// A document parsed, but is missing an identity field (`kind` or
    /// `metadata.name`) required to address it.
    #[error("template in '{file}' is missing required field '{field}'")]
    MissingIdentity { file: String, field: String },

    /// Two templates in the same discovery pass describe the same
    /// `(kind, name)` pair.
    #[error("duplicate resource {kind}/{name}: declared in both '{first_file}' and '{second_file}'")]
    DuplicateIdentity {
        kind: String,
        name: String,
        first_file: String,
        second_file: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
