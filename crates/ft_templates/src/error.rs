//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid manifest in template {template}: {message}")]
    Configuration { template: String, message: String },

    #[error("Validation failed for parameter '{parameter}' with value {value:?}: {message}")]
    Validation {
        parameter: String,
        value: String,
        message: String,
    },

    #[error("Unresolved token '{token}' in {path}")]
    UnresolvedToken { token: String, path: PathBuf },

    #[error("Invalid token '{token}' in {path}: unknown filter '{filter}'")]
    InvalidToken {
        token: String,
        filter: String,
        path: PathBuf,
    },

    #[error("Malformed token '{token}' in {path}")]
    MalformedToken { token: String, path: PathBuf },

    #[error("Destination already exists: {0}")]
    DestinationConflict(PathBuf),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl TemplateError {
    pub(crate) fn configuration(template: impl Into<String>, message: impl Into<String>) -> Self {
        TemplateError::Configuration {
            template: template.into(),
            message: message.into(),
        }
    }

    pub(crate) fn validation(
        parameter: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TemplateError::Validation {
            parameter: parameter.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}
