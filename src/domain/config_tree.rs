//! Config tree: the live configuration data edited by a session.

use std::fmt;

use tracing::trace;

use crate::domain::arena::{NodeId, TreeArena, TreeNode};
use crate::domain::error::{DomainError, DomainResult};

/// Per-node edit marker consumed by the commit step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    #[default]
    Unchanged,
    Added,
    Deleted,
    Changed,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Unchanged => "unchanged",
            NodeStatus::Added => "added",
            NodeStatus::Deleted => "deleted",
            NodeStatus::Changed => "changed",
        };
        f.write_str(s)
    }
}

/// Configuration payload of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    pub(crate) values: Vec<String>,
    pub(crate) comment: Option<String>,
    pub(crate) status: NodeStatus,
}

impl ConfigData {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Tombstoned nodes are kept only so the commit step sees the deletion.
    pub fn is_deleted(&self) -> bool {
        self.status == NodeStatus::Deleted
    }
}

pub type ConfigNode = TreeNode<ConfigData>;

/// Outcome of resolving a path against the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The path names a node.
    Node(NodeId),
    /// The last segment names one value of the node reached before it.
    Value(NodeId, String),
}

/// One edited node, as reported to the commit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: Vec<String>,
    pub status: NodeStatus,
}

/// Mutable configuration tree.
///
/// Lookups skip tombstones unless stated otherwise.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    nodes: TreeArena<ConfigData>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> NodeId {
        self.nodes.root()
    }

    pub fn arena(&self) -> &TreeArena<ConfigData> {
        &self.nodes
    }

    pub fn node(&self, idx: NodeId) -> Option<&ConfigNode> {
        self.nodes.get_node(idx)
    }

    pub fn path_of(&self, idx: NodeId) -> Vec<String> {
        self.nodes.path_of(idx)
    }

    /// Child by name, tombstones included.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.find_child(parent, name)
    }

    /// Child by name, tombstones excluded.
    pub fn live_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child(parent, name).filter(|&c| self.is_live(c))
    }

    pub fn live_children(&self, idx: NodeId) -> Vec<NodeId> {
        self.node(idx)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|&c| self.is_live(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_live(&self, idx: NodeId) -> bool {
        self.node(idx).is_some_and(|n| !n.data.is_deleted())
    }

    /// Live node at `path`.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(self.root(), |current, segment| {
            self.live_child(current, segment.as_ref())
        })
    }

    /// Node at `path`, a tombstone as the final node included.
    pub fn find_any<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        let (last, prefix) = path.split_last()?;
        let parent = self.find(prefix)?;
        self.child(parent, last.as_ref())
    }

    /// Resolves `path` to a live node, or to a value of the node reached
    /// just before the final segment.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<Target> {
        let mut current = self.root();
        for (pos, segment) in path.iter().enumerate() {
            let segment = segment.as_ref();
            match self.live_child(current, segment) {
                Some(child) => current = child,
                None if pos + 1 == path.len() => {
                    let node = self.node(current)?;
                    return node
                        .data
                        .values
                        .iter()
                        .any(|v| v == segment)
                        .then(|| Target::Value(current, segment.to_string()));
                }
                None => return None,
            }
        }
        Some(Target::Node(current))
    }

    /// Creates any missing nodes along `path` with status Unchanged.
    ///
    /// Used to populate the canonical configuration before a session starts.
    pub fn insert_path<S: AsRef<str>>(&mut self, path: &[S]) -> DomainResult<NodeId> {
        let mut current = self.root();
        for segment in path {
            let segment = segment.as_ref();
            current = match self.child(current, segment) {
                Some(child) => child,
                None => self.add_node(current, segment, NodeStatus::Unchanged)?,
            };
        }
        Ok(current)
    }

    /// Appends a value unless already present. Returns whether it was added.
    pub fn add_value(&mut self, idx: NodeId, value: &str) -> DomainResult<bool> {
        let data = self.data_mut(idx)?;
        if data.values.iter().any(|v| v == value) {
            return Ok(false);
        }
        data.values.push(value.to_string());
        Ok(true)
    }

    pub fn set_comment(&mut self, idx: NodeId, comment: Option<String>) -> DomainResult<()> {
        self.data_mut(idx)?.comment = comment;
        Ok(())
    }

    /// Every non-root node whose status is not Unchanged, in preorder.
    pub fn changes(&self) -> Vec<Change> {
        self.nodes
            .iter()
            .filter(|&(idx, node)| idx != self.root() && node.data.status != NodeStatus::Unchanged)
            .map(|(idx, node)| Change {
                path: self.path_of(idx),
                status: node.data.status,
            })
            .collect()
    }

    pub(crate) fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        status: NodeStatus,
    ) -> DomainResult<NodeId> {
        let data = ConfigData {
            status,
            ..ConfigData::default()
        };
        self.nodes.insert_child(parent, name, data)
    }

    pub(crate) fn data_mut(&mut self, idx: NodeId) -> DomainResult<&mut ConfigData> {
        self.nodes
            .get_node_mut(idx)
            .map(|n| &mut n.data)
            .ok_or(DomainError::NodeNotFound)
    }

    /// Removes a node: outright if it was added in this session, otherwise
    /// as a tombstone that keeps only its name and the Deleted status.
    pub(crate) fn remove_node(&mut self, idx: NodeId) -> DomainResult<()> {
        let status = self
            .node(idx)
            .ok_or(DomainError::NodeNotFound)?
            .data
            .status;

        if status == NodeStatus::Added {
            trace!(path = ?self.path_of(idx), "removing added node");
            self.nodes.remove_subtree(idx)?;
        } else {
            trace!(path = ?self.path_of(idx), "tombstoning node");
            if idx == self.root() {
                return Err(DomainError::RootRemoval);
            }
            self.nodes.clear_children(idx)?;
            let data = self.data_mut(idx)?;
            data.values.clear();
            data.comment = None;
            data.status = NodeStatus::Deleted;
        }
        Ok(())
    }

    /// Brings a tombstone back as an empty, changed node.
    pub(crate) fn revive(&mut self, idx: NodeId) -> DomainResult<()> {
        let data = self.data_mut(idx)?;
        data.values.clear();
        data.comment = None;
        data.status = NodeStatus::Changed;
        Ok(())
    }

    /// Like [`touch_ancestors`](Self::touch_ancestors), `idx` included.
    pub(crate) fn touch(&mut self, idx: NodeId) {
        if let Ok(data) = self.data_mut(idx) {
            if data.status == NodeStatus::Unchanged {
                data.status = NodeStatus::Changed;
            }
        }
        self.touch_ancestors(idx);
    }

    /// Unchanged ancestors of `idx` become Changed.
    pub(crate) fn touch_ancestors(&mut self, idx: NodeId) {
        let unchanged: Vec<NodeId> = self
            .nodes
            .ancestors(idx)
            .filter(|(_, n)| n.data.status == NodeStatus::Unchanged)
            .map(|(i, _)| i)
            .collect();
        for ancestor in unchanged {
            if let Some(node) = self.nodes.get_node_mut(ancestor) {
                node.data.status = NodeStatus::Changed;
            }
        }
    }
}
