//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent schema contract violations and validation failures.
/// These are independent of session and infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {path}")]
    UnknownNode { path: String },

    #[error("invalid value '{value}' for {path}")]
    InvalidValue { path: String, value: String },

    #[error("duplicate node '{name}' under {parent}")]
    DuplicateNode { parent: String, name: String },

    #[error("conflicting flags on {path}: {reason}")]
    ConflictingFlags { path: String, reason: String },

    #[error("unknown value type '{type_name}' referenced by {path}")]
    UnknownType { path: String, type_name: String },

    #[error("invalid {type_name} constraint '{constraint}' on {path}: {reason}")]
    InvalidConstraint {
        path: String,
        type_name: String,
        constraint: String,
        reason: String,
    },

    #[error("node not found in arena")]
    NodeNotFound,

    #[error("the root node cannot be removed")]
    RootRemoval,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Render a path the way a configure command line shows it.
pub fn fmt_path<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
