//! Staged, schema-validated configuration tree editing.
//!
//! A [`ReferenceTree`] describes which paths are legal and which values
//! they accept. A [`Session`] edits a [`ConfigTree`] against it, tracking a
//! per-node [`NodeStatus`] for the commit step that runs afterwards.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;

pub use application::{ErrorKind, Session, SessionError, SessionOptions, SessionResult, SessionState};
pub use config::Settings;
pub use domain::{
    Change, ConfigTree, DomainError, NodeKind, NodeStatus, PathValidator, ReferenceTree,
    ReferenceTreeBuilder, TypeRegistry,
};
pub use infrastructure::{EditLock, InProcessEditLock, InfraError, NoopEditLock, ServiceContainer};
