/*
Text rendering of config and reference subtrees via termtree.
Tombstones are skipped: the rendering shows what the configuration would
look like if committed now.
 */
use termtree::Tree;

use crate::domain::arena::NodeId;
use crate::domain::config_tree::ConfigTree;
use crate::domain::reference::ReferenceTree;

pub trait TreeRender {
    /// Builds a termtree rooted at `idx`, or None if `idx` is not present.
    fn to_tree_string(&self, idx: NodeId) -> Option<Tree<String>>;
}

impl TreeRender for ConfigTree {
    fn to_tree_string(&self, idx: NodeId) -> Option<Tree<String>> {
        if !self.is_live(idx) {
            return None;
        }
        let node = self.node(idx)?;

        let mut label = node.name.clone();
        if let Some(comment) = node.data.comment() {
            label = format!("/* {comment} */ {label}");
        }
        let mut tree = Tree::new(label);

        // A leaf's values hang below it, one line each, like children
        for value in node.data.values() {
            tree.push(Tree::new(format!("\"{value}\"")));
        }
        for child in self.live_children(idx) {
            if let Some(subtree) = self.to_tree_string(child) {
                tree.push(subtree);
            }
        }
        Some(tree)
    }
}

impl TreeRender for ReferenceTree {
    fn to_tree_string(&self, idx: NodeId) -> Option<Tree<String>> {
        let node = self.node(idx)?;
        let data = &node.data;

        let mut flags = Vec::new();
        if data.is_tag() {
            flags.push("tag".to_string());
        }
        if data.is_leaf() {
            flags.push(if data.is_multi() { "multi" } else { "leaf" }.to_string());
        }
        for vc in data.value_constraints() {
            match &vc.constraint {
                Some(c) => flags.push(format!("{}:{}", vc.type_name, c)),
                None => flags.push(vc.type_name.clone()),
            }
        }

        let label = if flags.is_empty() {
            node.name.clone()
        } else {
            format!("{} [{}]", node.name, flags.join(", "))
        };

        let leaves: Vec<_> = node
            .children
            .iter()
            .filter_map(|&c| self.to_tree_string(c))
            .collect();
        Some(Tree::new(label).with_leaves(leaves))
    }
}
