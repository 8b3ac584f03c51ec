//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::SessionError;

/// Infrastructure errors wrap session errors and add configuration concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
