use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{fmt_path, DomainError, DomainResult};

/// Handle to a node inside a [`TreeArena`].
///
/// Handles are generational: once a node is removed, its handle stops
/// resolving even if the slot is reused.
pub type NodeId = Index;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    /// Name, unique among siblings
    pub name: String,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<NodeId>,
    /// Indices of child nodes in insertion order
    pub children: Vec<NodeId>,
    /// Kind-specific payload
    pub data: T,
}

/// Arena-based tree structure shared by the reference and config trees.
///
/// The tree always has a root. Children are only ever created under an
/// existing node and never reparented, so the structure stays acyclic.
/// Upward walks go through parent indices rather than shared references.
#[derive(Debug, Clone)]
pub struct TreeArena<T> {
    arena: Arena<TreeNode<T>>,
    root: NodeId,
}

impl<T: Default> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new("root", T::default())
    }
}

impl<T> TreeArena<T> {
    pub fn new(root_name: impl Into<String>, data: T) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            name: root_name.into(),
            parent: None,
            children: Vec::new(),
            data,
        });
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode<T>> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: NodeId) -> Option<&mut TreeNode<T>> {
        self.arena.get_mut(idx)
    }

    pub fn contains(&self, idx: NodeId) -> bool {
        self.arena.contains(idx)
    }

    /// Looks up a direct child by name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get_node(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.get_node(child).is_some_and(|n| n.name == name))
    }

    /// Appends a new child under `parent`.
    ///
    /// Fails with `DuplicateNode` if a sibling already uses `name`.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert_child(&mut self, parent: NodeId, name: &str, data: T) -> DomainResult<NodeId> {
        if !self.contains(parent) {
            return Err(DomainError::NodeNotFound);
        }
        if self.find_child(parent, name).is_some() {
            return Err(DomainError::DuplicateNode {
                parent: fmt_path(&self.path_of(parent)),
                name: name.to_string(),
            });
        }

        let idx = self.arena.insert(TreeNode {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(idx);
        }
        Ok(idx)
    }

    /// Detaches `idx` from its parent and drops it together with its subtree.
    ///
    /// Returns the removed node (its `children` refer to already removed slots).
    #[instrument(level = "trace", skip(self))]
    pub fn remove_subtree(&mut self, idx: NodeId) -> DomainResult<TreeNode<T>> {
        if idx == self.root {
            return Err(DomainError::RootRemoval);
        }
        let parent = self
            .get_node(idx)
            .ok_or(DomainError::NodeNotFound)?
            .parent;

        if let Some(parent_node) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent_node.children.retain(|&c| c != idx);
        }

        self.clear_children(idx)?;
        self.arena.remove(idx).ok_or(DomainError::NodeNotFound)
    }

    /// Drops every descendant of `idx`, keeping `idx` itself.
    pub fn clear_children(&mut self, idx: NodeId) -> DomainResult<()> {
        let node = self.arena.get_mut(idx).ok_or(DomainError::NodeNotFound)?;
        let children = std::mem::take(&mut node.children);

        let mut stack = children;
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.arena.remove(current) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Iterates the ancestors of `idx`, nearest first, ending at the root.
    pub fn ancestors(&self, idx: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            arena: self,
            next: self.get_node(idx).and_then(|n| n.parent),
        }
    }

    /// Names from below the root down to `idx`.
    pub fn path_of(&self, idx: NodeId) -> Vec<String> {
        let mut path: Vec<String> = std::iter::once(idx)
            .chain(self.ancestors(idx).map(|(i, _)| i))
            .filter(|&i| i != self.root)
            .filter_map(|i| self.get_node(i).map(|n| n.name.clone()))
            .collect();
        path.reverse();
        path
    }

    /// Preorder traversal of the whole tree, children in insertion order.
    pub fn iter(&self) -> TreeIterator<'_, T> {
        self.iter_from(self.root)
    }

    /// Preorder traversal of the subtree rooted at `idx`.
    pub fn iter_from(&self, idx: NodeId) -> TreeIterator<'_, T> {
        let mut stack = Vec::new();
        if self.contains(idx) {
            stack.push(idx);
        }
        TreeIterator { arena: self, stack }
    }

    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct Ancestors<'a, T> {
    arena: &'a TreeArena<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let node = self.arena.get_node(current)?;
        self.next = node.parent;
        Some((current, node))
    }
}

pub struct TreeIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // root
    // ├── a
    // │   └── b
    // └── c
    fn sample() -> (TreeArena<u32>, NodeId, NodeId, NodeId) {
        let mut tree = TreeArena::new("root", 0);
        let root = tree.root();
        let a = tree.insert_child(root, "a", 1).unwrap();
        let b = tree.insert_child(a, "b", 2).unwrap();
        let c = tree.insert_child(root, "c", 3).unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_in_insertion_order() {
        let (tree, ..) = sample();
        let names: Vec<_> = tree.iter().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "b", "c"]);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn given_sibling_name_taken_when_inserting_then_duplicate_node() {
        let (mut tree, ..) = sample();
        let root = tree.root();
        let result = tree.insert_child(root, "a", 9);
        assert!(matches!(result, Err(DomainError::DuplicateNode { .. })));
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn given_nested_node_when_path_of_then_excludes_root() {
        let (tree, a, b, _) = sample();
        assert_eq!(tree.path_of(b), vec!["a", "b"]);
        let ancestors: Vec<_> = tree.ancestors(b).map(|(i, _)| i).collect();
        assert_eq!(ancestors, vec![a, tree.root()]);
        assert!(tree.path_of(tree.root()).is_empty());
    }

    #[test]
    fn given_subtree_when_removed_then_descendants_are_gone() {
        let (mut tree, a, b, c) = sample();
        tree.remove_subtree(a).unwrap();

        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.contains(c));
        assert_eq!(tree.find_child(tree.root(), "a"), None);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn given_root_when_removed_then_error() {
        let (mut tree, ..) = sample();
        let root = tree.root();
        assert_eq!(tree.remove_subtree(root).unwrap_err(), DomainError::RootRemoval);
    }
}
