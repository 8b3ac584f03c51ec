//! Infrastructure layer: boundary hooks and DI container
//!
//! This layer implements the boundary traits and wires up sessions.

pub mod di;
pub mod error;
pub mod traits;

pub use di::ServiceContainer;
pub use error::{InfraError, InfraResult};
pub use traits::{EditLock, InProcessEditLock, LockError, NoopEditLock};
