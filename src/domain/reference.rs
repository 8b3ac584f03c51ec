//! Reference tree: the schema describing legal configuration structure.

use tracing::instrument;

use crate::domain::arena::{NodeId, TreeArena, TreeNode};
use crate::domain::error::{fmt_path, DomainError, DomainResult};

/// Typed rule attached to a schema node: a value type plus an optional
/// type-specific constraint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueConstraint {
    pub type_name: String,
    pub constraint: Option<String>,
}

impl ValueConstraint {
    pub fn new(type_name: impl Into<String>, constraint: Option<&str>) -> Self {
        Self {
            type_name: type_name.into(),
            constraint: constraint.map(str::to_string),
        }
    }
}

/// Schema attributes of a reference node. All flags default to false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    leaf: bool,
    tag: bool,
    multi: bool,
    value_constraints: Vec<ValueConstraint>,
}

impl ReferenceData {
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn is_tag(&self) -> bool {
        self.tag
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn value_constraints(&self) -> &[ValueConstraint] {
        &self.value_constraints
    }
}

pub type ReferenceNode = TreeNode<ReferenceData>;

/// Schema tree. Built once by a loader, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTree {
    nodes: TreeArena<ReferenceData>,
}

impl ReferenceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> NodeId {
        self.nodes.root()
    }

    pub fn arena(&self) -> &TreeArena<ReferenceData> {
        &self.nodes
    }

    pub fn node(&self, idx: NodeId) -> Option<&ReferenceNode> {
        self.nodes.get_node(idx)
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.find_child(parent, name)
    }

    /// Adds a plain (non-leaf, non-tag) schema node under `parent`.
    ///
    /// A leaf cannot have schema children.
    #[instrument(level = "trace", skip(self))]
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> DomainResult<NodeId> {
        if self.data(parent)?.leaf {
            return Err(self.conflict(parent, format!("leaf cannot have child '{name}'")));
        }
        self.nodes.insert_child(parent, name, ReferenceData::default())
    }

    /// Finds the schema node for a literal path (no tag instances).
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(self.root(), |current, segment| {
            self.find_child(current, segment.as_ref())
        })
    }

    pub fn set_leaf(&mut self, idx: NodeId, value: bool) -> DomainResult<()> {
        let data = self.data(idx)?;
        if value && data.tag {
            return Err(self.conflict(idx, "tag node cannot be a leaf".into()));
        }
        if value && !self.nodes.get_node(idx).map_or(true, |n| n.children.is_empty()) {
            return Err(self.conflict(idx, "node with children cannot be a leaf".into()));
        }
        if !value && data.multi {
            return Err(self.conflict(idx, "multi node must stay a leaf".into()));
        }
        self.data_mut(idx)?.leaf = value;
        Ok(())
    }

    pub fn set_tag(&mut self, idx: NodeId, value: bool) -> DomainResult<()> {
        if value && self.data(idx)?.leaf {
            return Err(self.conflict(idx, "leaf node cannot be a tag".into()));
        }
        self.data_mut(idx)?.tag = value;
        Ok(())
    }

    pub fn set_multi(&mut self, idx: NodeId, value: bool) -> DomainResult<()> {
        if value && !self.data(idx)?.leaf {
            return Err(self.conflict(idx, "only leaf nodes can be multi".into()));
        }
        self.data_mut(idx)?.multi = value;
        Ok(())
    }

    pub fn add_value_constraint(
        &mut self,
        idx: NodeId,
        type_name: &str,
        constraint: Option<&str>,
    ) -> DomainResult<()> {
        if type_name.is_empty() {
            return Err(self.conflict(idx, "constraint type must not be empty".into()));
        }
        self.data_mut(idx)?
            .value_constraints
            .push(ValueConstraint::new(type_name, constraint));
        Ok(())
    }

    fn data(&self, idx: NodeId) -> DomainResult<&ReferenceData> {
        self.nodes
            .get_node(idx)
            .map(|n| &n.data)
            .ok_or(DomainError::NodeNotFound)
    }

    fn data_mut(&mut self, idx: NodeId) -> DomainResult<&mut ReferenceData> {
        self.nodes
            .get_node_mut(idx)
            .map(|n| &mut n.data)
            .ok_or(DomainError::NodeNotFound)
    }

    fn conflict(&self, idx: NodeId, reason: String) -> DomainError {
        DomainError::ConflictingFlags {
            path: fmt_path(&self.nodes.path_of(idx)),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_new_node_when_created_then_flags_default_false() {
        let mut tree = ReferenceTree::new();
        let foo = tree.add_node(tree.root(), "foo").unwrap();
        let data = &tree.node(foo).unwrap().data;
        assert!(!data.is_leaf());
        assert!(!data.is_tag());
        assert!(!data.is_multi());
        assert!(data.value_constraints().is_empty());
    }

    #[test]
    fn given_leaf_when_marking_tag_then_conflicting_flags() {
        let mut tree = ReferenceTree::new();
        let foo = tree.add_node(tree.root(), "foo").unwrap();
        tree.set_leaf(foo, true).unwrap();

        let err = tree.set_tag(foo, true).unwrap_err();
        assert!(matches!(err, DomainError::ConflictingFlags { .. }));
        assert!(!tree.node(foo).unwrap().data.is_tag());
    }

    #[test]
    fn given_non_leaf_when_marking_multi_then_conflicting_flags() {
        let mut tree = ReferenceTree::new();
        let foo = tree.add_node(tree.root(), "foo").unwrap();
        assert!(matches!(
            tree.set_multi(foo, true),
            Err(DomainError::ConflictingFlags { .. })
        ));
    }

    #[test]
    fn given_leaf_when_adding_child_then_conflicting_flags() {
        let mut tree = ReferenceTree::new();
        let foo = tree.add_node(tree.root(), "foo").unwrap();
        tree.set_leaf(foo, true).unwrap();
        assert!(tree.add_node(foo, "bar").is_err());
    }

    #[test]
    fn given_literal_path_when_lookup_then_finds_node() {
        let mut tree = ReferenceTree::new();
        let foo = tree.add_node(tree.root(), "foo").unwrap();
        let bar = tree.add_node(foo, "bar").unwrap();
        assert_eq!(tree.lookup(&["foo", "bar"]), Some(bar));
        assert_eq!(tree.lookup(&["foo", "nope"]), None);
        assert_eq!(tree.lookup::<&str>(&[]), Some(tree.root()));
    }
}
