//! Programmatic construction of reference trees.
//!
//! Loaders that read schema definitions translate them into builder calls;
//! the builder itself parses nothing.

use tracing::debug;

use crate::domain::arena::NodeId;
use crate::domain::error::DomainError;
use crate::domain::reference::ReferenceTree;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Constructs a reference tree from path declarations.
///
/// Missing ancestors are created as plain intermediate nodes. The first
/// contract violation is kept and reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ReferenceTreeBuilder {
    tree: ReferenceTree,
    error: Option<DomainError>,
}

impl ReferenceTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a plain node.
    pub fn node(self, path: &[&str]) -> Self {
        self.apply(path, |_, _| Ok(()))
    }

    /// Declares a tag node whose children form the schema of every instance.
    pub fn tag(self, path: &[&str]) -> Self {
        self.apply(path, |tree, idx| tree.set_tag(idx, true))
    }

    /// Declares a single-valued leaf.
    pub fn leaf(self, path: &[&str]) -> Self {
        self.apply(path, |tree, idx| tree.set_leaf(idx, true))
    }

    /// Declares a leaf holding an ordered set of values.
    pub fn multi(self, path: &[&str]) -> Self {
        self.apply(path, |tree, idx| {
            tree.set_leaf(idx, true)?;
            tree.set_multi(idx, true)
        })
    }

    /// Attaches a typed value constraint to the node at `path`.
    pub fn constraint(self, path: &[&str], type_name: &str, constraint: Option<&str>) -> Self {
        self.apply(path, |tree, idx| {
            tree.add_value_constraint(idx, type_name, constraint)
        })
    }

    pub fn build(self) -> TreeResult<ReferenceTree> {
        match self.error {
            Some(e) => Err(e),
            None => {
                debug!(nodes = self.tree.arena().node_count(), "reference tree built");
                Ok(self.tree)
            }
        }
    }

    fn apply(
        mut self,
        path: &[&str],
        f: impl FnOnce(&mut ReferenceTree, NodeId) -> TreeResult<()>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let result = Self::ensure_path(&mut self.tree, path).and_then(|idx| f(&mut self.tree, idx));
        if let Err(e) = result {
            self.error = Some(e);
        }
        self
    }

    fn ensure_path(tree: &mut ReferenceTree, path: &[&str]) -> TreeResult<NodeId> {
        let mut current = tree.root();
        for segment in path {
            current = match tree.find_child(current, segment) {
                Some(child) => child,
                None => tree.add_node(current, segment)?,
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_declaration_when_building_then_creates_ancestors() {
        let tree = ReferenceTreeBuilder::new()
            .multi(&["foo", "quux", "spam"])
            .build()
            .unwrap();

        let quux = tree.lookup(&["foo", "quux"]).unwrap();
        assert!(!tree.node(quux).unwrap().data.is_leaf());
        let spam = tree.lookup(&["foo", "quux", "spam"]).unwrap();
        assert!(tree.node(spam).unwrap().data.is_multi());
    }

    #[test]
    fn given_child_under_leaf_when_building_then_first_error_reported() {
        let result = ReferenceTreeBuilder::new()
            .leaf(&["foo"])
            .node(&["foo", "bar"])
            .tag(&["baz"])
            .build();
        assert!(matches!(result, Err(DomainError::ConflictingFlags { .. })));
    }
}
