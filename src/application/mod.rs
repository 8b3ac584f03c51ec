//! Application layer: edit sessions
//!
//! This layer applies domain validation to a config tree and depends on
//! boundary traits for locking.

pub mod error;
pub mod session;

pub use error::{ErrorKind, SessionError, SessionResult};
pub use session::{Session, SessionOptions, SessionState};
