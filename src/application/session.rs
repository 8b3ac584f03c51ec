//! Edit session: applies set/delete/query operations to one config tree.
//!
//! Every path argument is relative to the session level. Mutations are
//! validated and pre-checked completely before the tree is touched, so a
//! failing call leaves the tree as it was.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::error::{SessionError, SessionResult};
use crate::domain::{
    fmt_path, Change, ConfigTree, DomainError, NodeId, NodeKind, NodeStatus, PathValidator,
    Target, TreeRender,
};
use crate::infrastructure::traits::{EditLock, NoopEditLock};

/// Lifecycle of a session: New -> Editing -> Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    New,
    Editing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::New => "new",
            SessionState::Editing => "editing",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Behaviour switches for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Remove structural ancestors left empty after a leaf loses its last value.
    pub prune_empty_parents: bool,
}

pub struct Session {
    tree: ConfigTree,
    validator: Arc<PathValidator>,
    lock: Arc<dyn EditLock>,
    user: String,
    level: Vec<String>,
    state: SessionState,
    options: SessionOptions,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("level", &self.level)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a session over `tree` with default options and no locking.
    pub fn new(tree: ConfigTree, validator: Arc<PathValidator>, user: impl Into<String>) -> Self {
        Self {
            tree,
            validator,
            lock: Arc::new(NoopEditLock),
            user: user.into(),
            level: Vec::new(),
            state: SessionState::New,
            options: SessionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the edit lock consulted by [`configure`](Self::configure).
    pub fn with_lock(mut self, lock: Arc<dyn EditLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn config_tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// Enters edit mode, taking the edit lock. Idempotent while editing.
    #[instrument(level = "debug", skip(self), fields(user = %self.user))]
    pub fn configure(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Editing => Ok(()),
            SessionState::Closed => Err(SessionError::SessionClosed),
            SessionState::New => {
                self.lock.acquire(&self.user)?;
                self.state = SessionState::Editing;
                info!(user = %self.user, "entered edit mode");
                Ok(())
            }
        }
    }

    /// Leaves the session for good, releasing the edit lock if held.
    pub fn close(&mut self) {
        if self.state == SessionState::Editing {
            self.lock.release(&self.user);
            info!(user = %self.user, "left edit mode");
        }
        self.state = SessionState::Closed;
    }

    /// Closes the session and hands the staged tree to the commit step.
    pub fn into_tree(mut self) -> ConfigTree {
        self.close();
        std::mem::take(&mut self.tree)
    }

    pub fn set_level<S: AsRef<str>>(&mut self, path: &[S]) {
        self.level = path.iter().map(|s| s.as_ref().to_string()).collect();
        debug!(level = %fmt_path(&self.level), "level changed");
    }

    pub fn get_level(&self) -> &[String] {
        &self.level
    }

    /// Creates the nodes along `path` and applies a trailing leaf value.
    ///
    /// # Errors
    ///
    /// `NotInEditMode` outside edit mode; `UnknownNode` or `InvalidValue`
    /// from validation; `DuplicateValue` when a multi leaf already holds the
    /// value.
    #[instrument(level = "debug", skip(self, path), fields(user = %self.user, path = %fmt_path(path)))]
    pub fn set<S: AsRef<str>>(&mut self, path: &[S]) -> SessionResult<()> {
        self.require_editing()?;
        let full = self.full_path(path);
        let resolved = self.validator.validate(&full)?;
        let names = resolved.names();

        if let (Some(value), NodeKind::MultiLeaf) = (&resolved.value, resolved.kind) {
            let present = self
                .tree
                .find(&names)
                .and_then(|idx| self.tree.node(idx))
                .is_some_and(|n| n.data.values().contains(value));
            if present {
                return Err(SessionError::DuplicateValue {
                    path: fmt_path(&names),
                    value: value.clone(),
                });
            }
        }

        let mut current = self.tree.root();
        let mut touched = false;
        let mut created = false;
        for name in &names {
            created = false;
            current = match self.tree.child(current, name) {
                Some(child) if self.tree.is_live(child) => child,
                Some(tombstone) => {
                    self.tree.revive(tombstone)?;
                    touched = true;
                    tombstone
                }
                None => {
                    created = true;
                    touched = true;
                    self.tree.add_node(current, name, NodeStatus::Added)?
                }
            };
        }

        if let Some(value) = &resolved.value {
            let data = self.tree.data_mut(current)?;
            if resolved.kind != NodeKind::MultiLeaf && data.values == [value.as_str()] {
                debug!("leaf already holds value");
                return Ok(());
            }
            if resolved.kind == NodeKind::MultiLeaf {
                data.values.push(value.clone());
            } else {
                data.values = vec![value.clone()];
            }
            if !created {
                data.status = NodeStatus::Changed;
            }
            touched = true;
        }

        if touched {
            self.tree.touch_ancestors(current);
            debug!(kind = ?resolved.kind, "set applied");
        }
        Ok(())
    }

    /// Removes a value, or a node with its whole subtree.
    ///
    /// Only the live tree is consulted; the schema is not.
    #[instrument(level = "debug", skip(self, path), fields(user = %self.user, path = %fmt_path(path)))]
    pub fn delete<S: AsRef<str>>(&mut self, path: &[S]) -> SessionResult<()> {
        self.require_editing()?;
        let full = self.full_path(path);
        let target = self
            .tree
            .resolve(&full)
            .filter(|_| !full.is_empty())
            .ok_or_else(|| SessionError::PathNotFound {
                path: fmt_path(&full),
            })?;

        let survivor = match target {
            Target::Value(idx, value) => {
                // An emptied leaf keeps its status so removal can tell
                // nodes added in this session from pre-existing ones
                let emptied = {
                    let data = self.tree.data_mut(idx)?;
                    data.values.retain(|v| *v != value);
                    let emptied = data.values.is_empty();
                    if !emptied {
                        data.status = NodeStatus::Changed;
                    }
                    emptied
                };
                if emptied {
                    let parent = self.parent_of(idx)?;
                    self.tree.remove_node(idx)?;
                    if self.options.prune_empty_parents {
                        self.prune_upwards(parent)?
                    } else {
                        parent
                    }
                } else {
                    idx
                }
            }
            Target::Node(idx) => {
                let parent = self.parent_of(idx)?;
                self.tree.remove_node(idx)?;
                parent
            }
        };

        self.tree.touch(survivor);
        debug!("delete applied");
        Ok(())
    }

    /// Whether `path` names a live node or one of its values.
    pub fn exists<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.tree.resolve(&self.full_path(path)).is_some()
    }

    /// Values of the leaf at `path`; empty when the leaf is unset.
    pub fn get_values<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<Vec<String>> {
        let full = self.full_path(path);
        let resolved = self.validator.validate(&full)?;
        if !resolved.kind.is_leaf() || resolved.value.is_some() {
            return Err(SessionError::NotALeaf {
                path: fmt_path(&full),
            });
        }
        Ok(self
            .tree
            .find(&full)
            .and_then(|idx| self.tree.node(idx))
            .map(|n| n.data.values().to_vec())
            .unwrap_or_default())
    }

    /// Names of the live children of the node at `path`.
    pub fn list_nodes<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<Vec<String>> {
        let idx = self.find_live(path)?;
        Ok(self
            .tree
            .live_children(idx)
            .into_iter()
            .filter_map(|c| self.tree.node(c).map(|n| n.name.clone()))
            .collect())
    }

    pub fn set_comment<S: AsRef<str>>(
        &mut self,
        path: &[S],
        text: impl Into<String>,
    ) -> SessionResult<()> {
        self.require_editing()?;
        let idx = self.find_live(path)?;
        self.tree.set_comment(idx, Some(text.into()))?;
        Ok(())
    }

    pub fn get_comment<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<Option<String>> {
        let idx = self.find_live(path)?;
        Ok(self
            .tree
            .node(idx)
            .and_then(|n| n.data.comment().map(str::to_string)))
    }

    /// Edit status of the node at `path`, deleted nodes included.
    pub fn get_node_status<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<NodeStatus> {
        let full = self.full_path(path);
        let idx = if full.is_empty() {
            Some(self.tree.root())
        } else {
            self.tree.find_any(&full)
        };
        idx.and_then(|idx| self.tree.node(idx))
            .map(|n| n.data.status())
            .ok_or_else(|| SessionError::PathNotFound {
                path: fmt_path(&full),
            })
    }

    /// Renders the live subtree at `path`.
    pub fn show<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<String> {
        let idx = self.find_live(path)?;
        self.tree
            .to_tree_string(idx)
            .map(|t| t.to_string())
            .ok_or(SessionError::Contract(DomainError::NodeNotFound))
    }

    /// Every edited node in preorder, for the commit step.
    pub fn changes(&self) -> Vec<Change> {
        self.tree.changes()
    }

    fn require_editing(&self) -> SessionResult<()> {
        if self.state != SessionState::Editing {
            warn!(state = %self.state, "mutation rejected outside edit mode");
            return Err(SessionError::NotInEditMode { state: self.state });
        }
        Ok(())
    }

    fn full_path<S: AsRef<str>>(&self, path: &[S]) -> Vec<String> {
        self.level
            .iter()
            .cloned()
            .chain(path.iter().map(|s| s.as_ref().to_string()))
            .collect()
    }

    fn find_live<S: AsRef<str>>(&self, path: &[S]) -> SessionResult<NodeId> {
        let full = self.full_path(path);
        self.tree.find(&full).ok_or_else(|| SessionError::PathNotFound {
            path: fmt_path(&full),
        })
    }

    fn parent_of(&self, idx: NodeId) -> SessionResult<NodeId> {
        self.tree
            .node(idx)
            .and_then(|n| n.parent)
            .ok_or(SessionError::Contract(DomainError::RootRemoval))
    }

    /// Removes empty non-root nodes from `start` upward. Returns the first
    /// node kept.
    fn prune_upwards(&mut self, start: NodeId) -> SessionResult<NodeId> {
        let mut current = start;
        while current != self.tree.root() {
            let empty = self.tree.live_children(current).is_empty()
                && self
                    .tree
                    .node(current)
                    .is_some_and(|n| n.data.values().is_empty());
            if !empty {
                break;
            }
            let parent = self.parent_of(current)?;
            debug!(path = %fmt_path(&self.tree.path_of(current)), "pruning empty parent");
            self.tree.remove_node(current)?;
            current = parent;
        }
        Ok(current)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Editing {
            self.lock.release(&self.user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReferenceTreeBuilder, TypeRegistry};

    fn session() -> Session {
        let reference = ReferenceTreeBuilder::new()
            .leaf(&["system", "host-name"])
            .multi(&["system", "name-server"])
            .build()
            .unwrap();
        let validator =
            PathValidator::new(Arc::new(reference), TypeRegistry::with_builtins()).unwrap();
        Session::new(ConfigTree::new(), Arc::new(validator), "admin")
    }

    #[test]
    fn given_new_session_when_setting_then_not_in_edit_mode() {
        let mut s = session();
        let err = s.set(&["system", "host-name", "r1"]).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotInEditMode {
                state: SessionState::New
            }
        );
        assert!(s.changes().is_empty());
    }

    #[test]
    fn given_closed_session_when_configuring_then_session_closed() {
        let mut s = session();
        s.configure().unwrap();
        s.close();
        assert_eq!(s.configure(), Err(SessionError::SessionClosed));
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn given_value_under_added_leaf_when_set_again_then_changed() {
        let mut s = session();
        s.configure().unwrap();
        s.set(&["system", "host-name", "r1"]).unwrap();
        assert_eq!(
            s.get_node_status(&["system", "host-name"]).unwrap(),
            NodeStatus::Added
        );
        s.set(&["system", "host-name", "r2"]).unwrap();
        assert_eq!(
            s.get_node_status(&["system", "host-name"]).unwrap(),
            NodeStatus::Changed
        );
        assert_eq!(s.get_values(&["system", "host-name"]).unwrap(), ["r2"]);
    }

    #[test]
    fn given_session_when_into_tree_then_tree_handed_over() {
        let mut s = session();
        s.configure().unwrap();
        s.set(&["system", "name-server", "192.0.2.1"]).unwrap();
        let tree = s.into_tree();
        assert!(tree.find(&["system", "name-server"]).is_some());
    }
}
