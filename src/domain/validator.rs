//! Path validation against the reference tree.
//!
//! The validator is read-only and `Send + Sync`; one instance is shared by
//! every session through an `Arc`.

use std::sync::Arc;

use tracing::{instrument, trace};

use crate::domain::arena::NodeId;
use crate::domain::error::{fmt_path, DomainError, DomainResult};
use crate::domain::reference::{ReferenceData, ReferenceTree, ValueConstraint};
use crate::domain::types::TypeRegistry;

/// Effective kind of the deepest schema node a path reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Intermediate,
    Tag,
    Leaf,
    MultiLeaf,
}

impl NodeKind {
    fn of(data: &ReferenceData) -> Self {
        match (data.is_tag(), data.is_leaf(), data.is_multi()) {
            (true, _, _) => NodeKind::Tag,
            (false, true, true) => NodeKind::MultiLeaf,
            (false, true, false) => NodeKind::Leaf,
            (false, false, _) => NodeKind::Intermediate,
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Leaf | NodeKind::MultiLeaf)
    }
}

/// Structural path segment, as classified during the schema walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Names a schema child.
    Literal(String),
    /// User-chosen instance identifier under a tag node.
    Instance(String),
}

impl Segment {
    pub fn name(&self) -> &str {
        match self {
            Segment::Literal(name) | Segment::Instance(name) => name,
        }
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub kind: NodeKind,
    /// Structural segments, one per config node along the path.
    pub segments: Vec<Segment>,
    /// Trailing value presented to a leaf, if any.
    pub value: Option<String>,
}

impl ResolvedPath {
    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(Segment::name).collect()
    }
}

/// Resolves candidate paths against a shared reference tree.
#[derive(Debug, Clone)]
pub struct PathValidator {
    tree: Arc<ReferenceTree>,
    types: TypeRegistry,
}

impl PathValidator {
    /// Creates a validator after checking that every constraint in the tree
    /// names a registered type and is well formed for it.
    pub fn new(tree: Arc<ReferenceTree>, types: TypeRegistry) -> DomainResult<Self> {
        for (idx, node) in tree.arena().iter() {
            for vc in node.data.value_constraints() {
                let path = || fmt_path(&tree.arena().path_of(idx));
                let value_type = types.get(&vc.type_name).ok_or_else(|| DomainError::UnknownType {
                    path: path(),
                    type_name: vc.type_name.clone(),
                })?;
                if let Some(constraint) = &vc.constraint {
                    value_type.check_constraint(constraint).map_err(|reason| {
                        DomainError::InvalidConstraint {
                            path: path(),
                            type_name: vc.type_name.clone(),
                            constraint: constraint.clone(),
                            reason,
                        }
                    })?;
                }
            }
        }
        Ok(Self { tree, types })
    }

    pub fn reference_tree(&self) -> &ReferenceTree {
        &self.tree
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Walks `path` through the schema.
    ///
    /// # Errors
    ///
    /// `UnknownNode` when a segment matches no schema child (or follows a
    /// leaf value), `InvalidValue` when a value or tag instance fails the
    /// node's constraints.
    #[instrument(level = "debug", skip(self, path), fields(path = %fmt_path(path)))]
    pub fn validate<S: AsRef<str>>(&self, path: &[S]) -> DomainResult<ResolvedPath> {
        let mut current = self.tree.root();
        let mut awaiting_instance = false;
        let mut segments = Vec::with_capacity(path.len());
        let mut value = None;

        for (pos, segment) in path.iter().enumerate() {
            let segment = segment.as_ref();
            let data = self.data(current)?;

            if awaiting_instance {
                self.check_value(data, &path[..=pos], segment)?;
                segments.push(Segment::Instance(segment.to_string()));
                awaiting_instance = false;
                continue;
            }

            if data.is_leaf() {
                if pos + 1 != path.len() {
                    return Err(DomainError::UnknownNode {
                        path: fmt_path(&path[..=pos + 1]),
                    });
                }
                self.check_value(data, &path[..pos], segment)?;
                value = Some(segment.to_string());
                break;
            }

            let child = self
                .tree
                .find_child(current, segment)
                .ok_or_else(|| DomainError::UnknownNode {
                    path: fmt_path(&path[..=pos]),
                })?;
            segments.push(Segment::Literal(segment.to_string()));
            current = child;
            awaiting_instance = self.data(current)?.is_tag();
        }

        let kind = NodeKind::of(self.data(current)?);
        trace!(?kind, segments = segments.len(), has_value = value.is_some(), "resolved");
        Ok(ResolvedPath {
            kind,
            segments,
            value,
        })
    }

    /// Accepts when some constraint type group accepts the value: every
    /// constraint of that type must pass. No constraints admit anything.
    fn check_value<S: AsRef<str>>(
        &self,
        data: &ReferenceData,
        path: &[S],
        value: &str,
    ) -> DomainResult<()> {
        let constraints = data.value_constraints();
        if constraints.is_empty() || self.group_accepts(constraints, value) {
            return Ok(());
        }
        Err(DomainError::InvalidValue {
            path: fmt_path(path),
            value: value.to_string(),
        })
    }

    fn group_accepts(&self, constraints: &[ValueConstraint], value: &str) -> bool {
        let mut type_names: Vec<&str> = Vec::new();
        for vc in constraints {
            if !type_names.contains(&vc.type_name.as_str()) {
                type_names.push(&vc.type_name);
            }
        }

        type_names.into_iter().any(|type_name| {
            let Some(value_type) = self.types.get(type_name) else {
                return false;
            };
            constraints
                .iter()
                .filter(|vc| vc.type_name == type_name)
                .all(|vc| value_type.accepts(value, vc.constraint.as_deref()))
        })
    }

    fn data(&self, idx: NodeId) -> DomainResult<&ReferenceData> {
        self.tree
            .node(idx)
            .map(|n| &n.data)
            .ok_or(DomainError::NodeNotFound)
    }
}
