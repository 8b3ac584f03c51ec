//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::application::session::SessionState;
use crate::domain::DomainError;
use crate::infrastructure::traits::LockError;

/// Errors reported by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown node: {path}")]
    UnknownNode { path: String },

    #[error("invalid value '{value}' for {path}")]
    InvalidValue { path: String, value: String },

    #[error("value '{value}' already present at {path}")]
    DuplicateValue { path: String, value: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("not in edit mode (session is {state})")]
    NotInEditMode { state: SessionState },

    #[error("not a leaf node: {path}")]
    NotALeaf { path: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("{0}")]
    Lock(#[from] LockError),

    #[error("contract violation: {0}")]
    Contract(DomainError),
}

/// Validation failures keep their own kind, everything else the domain
/// reports at this layer is a broken invariant.
impl From<DomainError> for SessionError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownNode { path } => Self::UnknownNode { path },
            DomainError::InvalidValue { path, value } => Self::InvalidValue { path, value },
            other => Self::Contract(other),
        }
    }
}

/// Stable classification for callers that map errors to their own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownNode,
    InvalidValue,
    DuplicateValue,
    PathNotFound,
    NotInEditMode,
    NotALeaf,
    SessionClosed,
    Locked,
    Contract,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnknownNode => "ERR_UNKNOWN_NODE",
            ErrorKind::InvalidValue => "ERR_INVALID_VALUE",
            ErrorKind::DuplicateValue => "ERR_DUPLICATE_VALUE",
            ErrorKind::PathNotFound => "ERR_PATH_NOT_FOUND",
            ErrorKind::NotInEditMode => "ERR_NOT_IN_EDIT_MODE",
            ErrorKind::NotALeaf => "ERR_NOT_A_LEAF",
            ErrorKind::SessionClosed => "ERR_SESSION_CLOSED",
            ErrorKind::Locked => "ERR_LOCKED",
            ErrorKind::Contract => "ERR_CONTRACT",
        }
    }
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::UnknownNode { .. } => ErrorKind::UnknownNode,
            SessionError::InvalidValue { .. } => ErrorKind::InvalidValue,
            SessionError::DuplicateValue { .. } => ErrorKind::DuplicateValue,
            SessionError::PathNotFound { .. } => ErrorKind::PathNotFound,
            SessionError::NotInEditMode { .. } => ErrorKind::NotInEditMode,
            SessionError::NotALeaf { .. } => ErrorKind::NotALeaf,
            SessionError::SessionClosed => ErrorKind::SessionClosed,
            SessionError::Lock(_) => ErrorKind::Locked,
            SessionError::Contract(_) => ErrorKind::Contract,
        }
    }
}

/// Result type for application layer operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_domain_validation_error_when_converting_then_keeps_kind() {
        let err: SessionError = DomainError::InvalidValue {
            path: "foo".into(),
            value: "x".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(err.kind().code(), "ERR_INVALID_VALUE");
    }

    #[test]
    fn given_domain_contract_error_when_converting_then_contract() {
        let err: SessionError = DomainError::RootRemoval.into();
        assert_eq!(err.kind(), ErrorKind::Contract);
    }
}
