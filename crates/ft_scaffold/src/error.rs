//! Error types for scaffolding.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scaffold operations.
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Errors that can occur while scaffolding a resource.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Invalid resource name '{0}': use a CamelCase name such as Post or BlogPost")]
    InvalidResourceName(String),

    #[error("Invalid field definition '{0}': use the form name:type")]
    InvalidFieldDefinition(String),

    #[error("Invalid field type '{field_type}' for field '{field}'. Valid types: {valid}")]
    InvalidFieldType {
        field: String,
        field_type: String,
        valid: String,
    },

    #[error("Invalid field name '{0}'")]
    InvalidFieldName(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("No 'app' directory found in {0}; run this inside a project created with 'flasktrack init'")]
    NotAProject(PathBuf),

    #[error("Invalid scaffold configuration in {path}: {message}")]
    Configuration { path: PathBuf, message: String },

    #[error("File already exists: {0}")]
    DestinationConflict(PathBuf),

    #[error("Template error: {0}")]
    Template(#[from] ft_templates::TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScaffoldError {
    /// Whether this error is a rejected resource or field specification.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScaffoldError::InvalidResourceName(_)
                | ScaffoldError::InvalidFieldDefinition(_)
                | ScaffoldError::InvalidFieldType { .. }
                | ScaffoldError::InvalidFieldName(_)
                | ScaffoldError::DuplicateField(_)
        )
    }
}
