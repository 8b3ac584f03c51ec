//! Domain layer: trees, schema and path validation
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod builder;
pub mod config_tree;
pub mod error;
pub mod reference;
pub mod render;
pub mod types;
pub mod validator;

pub use arena::{NodeId, TreeArena, TreeNode};
pub use builder::ReferenceTreeBuilder;
pub use config_tree::{Change, ConfigData, ConfigNode, ConfigTree, NodeStatus, Target};
pub use error::{fmt_path, DomainError, DomainResult};
pub use reference::{ReferenceData, ReferenceNode, ReferenceTree, ValueConstraint};
pub use render::TreeRender;
pub use types::{ChoiceType, IntegerType, StringType, TypeRegistry, ValueType};
pub use validator::{NodeKind, PathValidator, ResolvedPath, Segment};
