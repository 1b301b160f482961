//! The node arena and its structural edits.
//!
//! A [`Tree`] owns every node it creates. Nodes start out detached and become
//! part of a hierarchy when they are inserted under a parent. Removing a node
//! destroys it together with all of its descendants.
//!
//! Flag getters (`is_visible`, `is_expanded`, ...) answer `false` for IDs that
//! do not resolve; everything that mutates reports [`TreeError::InvalidNode`].
//!
//! # Example
//!
//! ```
//! use horizon_treeview::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.create_node("root".to_string());
//! let a = tree.add_child(root, "a".to_string()).unwrap();
//! let b = tree.add_child(root, "b".to_string()).unwrap();
//!
//! assert_eq!(tree.children(root).unwrap(), &[a, b]);
//! assert!(!tree.is_visible(a)); // root is collapsed
//!
//! tree.set_expanded(root, true).unwrap();
//! assert!(tree.is_visible(a));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_treeview_core::logging::targets;
use horizon_treeview_core::{DebugTree, Signal, TreeFormatter};
use slotmap::SlotMap;

use crate::checkbox::CheckState;
use crate::error::{Result, TreeError};
use crate::flattener::Projection;
use crate::lazy::ChildLoader;
use crate::node::{NodeId, NodeProperty, TreeNode, TreeNodeData};

/// Signals emitted by a [`Tree`].
///
/// Row signals carry the index of the first affected row of the attached
/// projection and the affected nodes in row order. They are only emitted
/// while a projection is attached.
pub struct TreeSignals {
    /// Emitted after rows appear: `(index, nodes)`.
    pub rows_inserted: Signal<(usize, Vec<NodeId>)>,
    /// Emitted after rows disappear: `(index, nodes)`. The index is where the
    /// run started before the removal.
    pub rows_removed: Signal<(usize, Vec<NodeId>)>,
    /// Emitted when a per-node flag changes value.
    pub property_changed: Signal<(NodeId, NodeProperty)>,
}

impl Default for TreeSignals {
    fn default() -> Self {
        Self {
            rows_inserted: Signal::new(),
            rows_removed: Signal::new(),
            property_changed: Signal::new(),
        }
    }
}

/// An arena of nodes forming one or more hierarchies.
pub struct Tree<T> {
    pub(crate) nodes: SlotMap<NodeId, TreeNode<T>>,
    pub(crate) loader: Option<Arc<dyn ChildLoader<T>>>,
    pub(crate) projection: Option<Projection>,
    pub(crate) signals: TreeSignals,
}

impl<T: TreeNodeData> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TreeNodeData> Tree<T> {
    /// Create an empty tree with no child provider.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            loader: None,
            projection: None,
            signals: TreeSignals::default(),
        }
    }

    /// The tree's signals.
    pub fn signals(&self) -> &TreeSignals {
        &self.signals
    }

    /// Create a detached node.
    pub fn create_node(&mut self, data: T) -> NodeId {
        self.create_node_with(data, |_| {})
    }

    /// Create a detached node, adjusting its flags before it is stored.
    pub(crate) fn create_node_with(&mut self, data: T, init: impl FnOnce(&mut TreeNode<T>)) -> NodeId {
        let mut node = TreeNode::new(data);
        init(&mut node);
        let id = self.nodes.insert(node);
        tracing::trace!(target: targets::TREE, ?id, "created node");
        id
    }

    /// Create a node and append it to `parent`.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> Result<NodeId> {
        self.node(parent)?;
        let child = self.create_node(data);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Whether the ID resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes across all hierarchies.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&TreeNode<T>> {
        self.nodes.get(id).ok_or(TreeError::InvalidNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode<T>> {
        self.nodes.get_mut(id).ok_or(TreeError::InvalidNode(id))
    }

    /// The node's payload.
    pub fn data(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.data)
    }

    /// Mutable access to the node's payload.
    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|n| &mut n.data)
    }

    /// The payload's display text.
    pub fn text(&self, id: NodeId) -> Option<String> {
        self.data(id).map(TreeNodeData::text)
    }

    /// The node's parent, `None` for a root.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.node(id).map(|n| n.parent)
    }

    /// The node's children, in order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.node(id).map(|n| n.children.as_slice())
    }

    /// Number of direct children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.children.len())
    }

    /// Iterate over the node's ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.nodes.get(id).and_then(|n| n.parent),
        }
    }

    /// All descendants in pre-order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let Some(node) = self.nodes.get(id) else {
            return result;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Some(n) = self.nodes.get(current) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        result
    }

    /// The topmost ancestor of the node (the node itself when parentless).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Depth below the hierarchy's root; roots are at level 0.
    pub fn level(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Whether the node has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.parent.is_none())
    }

    /// Whether the node is the last child of its parent.
    pub fn is_last(&self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) else {
            return true;
        };
        self.nodes[parent].children.last() == Some(&id)
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.hidden)
    }

    /// Whether the node currently occupies a row of its hierarchy.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.expanded)
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.selected)
    }

    pub fn is_editing(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.editing)
    }

    pub fn check_state(&self, id: NodeId) -> CheckState {
        self.nodes.get(id).map(|n| n.check_state).unwrap_or_default()
    }

    pub fn is_checkable(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.data.is_checkable())
    }

    pub fn is_editable(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.data.is_editable())
    }

    /// Whether an expander should be drawn next to the node.
    pub fn show_expander(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| {
            n.lazy_loading || n.children.iter().any(|&c| !self.nodes[c].hidden)
        })
    }

    /// Insert detached nodes into `parent`'s children at `index`.
    ///
    /// The batch becomes a contiguous run of siblings and, when it produces
    /// visible rows, is reported as a single `rows_inserted` notification.
    #[tracing::instrument(skip(self), target = "horizon_treeview::tree", level = "debug")]
    pub fn insert_children(&mut self, parent: NodeId, index: usize, nodes: &[NodeId]) -> Result<()> {
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        self.validate_insert(parent, nodes)?;
        if nodes.is_empty() {
            return Ok(());
        }

        for &id in nodes {
            self.nodes[id].parent = Some(parent);
        }
        self.nodes[parent]
            .children
            .splice(index..index, nodes.iter().copied());

        let parent_shows = self.nodes[parent].shows_children();
        self.propagate_visibility(nodes.iter().map(|&id| (id, parent_shows)).collect());
        if nodes.iter().any(|&id| self.nodes[id].visible) {
            self.invalidate_upward(Some(parent));
        }

        tracing::debug!(target: targets::TREE, ?parent, index, count = nodes.len(), "inserted children");

        let block = self.rows_of_run(parent, nodes);
        self.notify_rows_inserted(block);

        if nodes.iter().any(|&id| self.nodes[id].data.is_checkable()) {
            self.rederive_check_states(parent);
        }
        Ok(())
    }

    /// Append a detached node to `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.append_children(parent, &[child])
    }

    /// Append detached nodes to `parent`'s children.
    pub fn append_children(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        let len = self.node(parent)?.children.len();
        self.insert_children(parent, len, nodes)
    }

    fn validate_insert(&self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        let parent_root = self.root_of(parent);
        let projection_root = self.projection.as_ref().map(|p| p.root);
        let mut seen = HashSet::with_capacity(nodes.len());

        for &id in nodes {
            let node = self.node(id)?;
            if projection_root == Some(id) {
                return Err(TreeError::RootAttached(id));
            }
            if let Some(existing) = node.parent {
                return Err(TreeError::AlreadyParented {
                    node: id,
                    parent: existing,
                });
            }
            if id == parent_root {
                return Err(TreeError::WouldCreateCycle { node: id, parent });
            }
            if !seen.insert(id) {
                return Err(TreeError::DuplicateNode(id));
            }
        }
        Ok(())
    }

    /// Remove children of `parent`, destroying them and their descendants.
    ///
    /// Each contiguous run of removed siblings is reported as one
    /// `rows_removed` notification. Runs are processed from the back so every
    /// notification index is valid at the moment it is emitted.
    #[tracing::instrument(skip(self), target = "horizon_treeview::tree", level = "debug")]
    pub fn remove_children(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        self.node(parent)?;
        let mut targets_set = HashSet::with_capacity(nodes.len());
        for &id in nodes {
            let node = self.node(id)?;
            if node.parent != Some(parent) {
                return Err(TreeError::NotAChild { node: id, parent });
            }
            if !targets_set.insert(id) {
                return Err(TreeError::DuplicateNode(id));
            }
        }
        if nodes.is_empty() {
            return Ok(());
        }

        let positions: Vec<usize> = self.nodes[parent]
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| targets_set.contains(*c))
            .map(|(i, _)| i)
            .collect();

        let mut runs: Vec<(usize, usize)> = Vec::new();
        for pos in positions {
            match runs.last_mut() {
                Some((_, end)) if *end == pos => *end = pos + 1,
                _ => runs.push((pos, pos + 1)),
            }
        }

        let mut rederive = false;
        for &(start, end) in runs.iter().rev() {
            let run: Vec<NodeId> = self.nodes[parent].children[start..end].to_vec();
            let block = self.rows_of_run(parent, &run);

            self.nodes[parent].children.drain(start..end);
            let any_visible = run.iter().any(|&id| self.nodes[id].visible);
            rederive |= run.iter().any(|&id| self.nodes[id].data.is_checkable());
            for id in run {
                self.destroy_subtree(id);
            }
            if any_visible {
                self.invalidate_upward(Some(parent));
            }

            self.notify_rows_removed(block);
        }

        tracing::debug!(target: targets::TREE, ?parent, count = nodes.len(), runs = runs.len(), "removed children");

        if rederive {
            self.rederive_check_states(parent);
        }
        Ok(())
    }

    /// Remove every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<()> {
        let children = self.node(parent)?.children.clone();
        self.remove_children(parent, &children)
    }

    /// Remove a node from the tree.
    ///
    /// A child is removed from its parent. A detached root is destroyed
    /// outright, unless it backs the attached projection.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)?.parent {
            Some(parent) => self.remove_children(parent, &[id]),
            None => {
                if self.projection.as_ref().is_some_and(|p| p.root == id) {
                    return Err(TreeError::RootAttached(id));
                }
                self.destroy_subtree(id);
                Ok(())
            }
        }
    }

    /// Free a node and its descendants. The node must already be unlinked.
    fn destroy_subtree(&mut self, id: NodeId) {
        let descendants = self.descendants(id);
        tracing::trace!(target: targets::TREE, ?id, descendant_count = descendants.len(), "destroying subtree");
        for child in descendants {
            self.nodes.remove(child);
        }
        self.nodes.remove(id);
    }

    /// Set the node's selection flag. Returns whether it changed.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<bool> {
        let node = self.node_mut(id)?;
        if node.selected == selected {
            return Ok(false);
        }
        node.selected = selected;
        self.emit_property(id, NodeProperty::Selected);
        Ok(true)
    }

    /// Set the node's in-place editing flag. Returns whether it changed.
    pub fn set_editing(&mut self, id: NodeId, editing: bool) -> Result<bool> {
        let node = self.node_mut(id)?;
        if node.editing == editing {
            return Ok(false);
        }
        node.editing = editing;
        self.emit_property(id, NodeProperty::Editing);
        Ok(true)
    }

    pub(crate) fn emit_property(&self, id: NodeId, property: NodeProperty) {
        tracing::trace!(target: targets::TREE, ?id, ?property, "property changed");
        self.signals.property_changed.emit((id, property));
    }

    /// Render the subtree under `id` for debugging.
    pub fn dump(&self, id: NodeId) -> String {
        TreeFormatter::new().format_subtree(self, id)
    }
}

impl<T: TreeNodeData> DebugTree for Tree<T> {
    type Id = NodeId;

    fn debug_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(<[NodeId]>::to_vec).unwrap_or_default()
    }

    fn debug_label(&self, id: NodeId) -> String {
        self.text(id).unwrap_or_else(|| "<destroyed>".to_string())
    }

    fn debug_flags(&self, id: NodeId) -> Vec<&'static str> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut flags = Vec::new();
        if node.visible {
            flags.push("visible");
        }
        if node.hidden {
            flags.push("hidden");
        }
        if node.expanded {
            flags.push("expanded");
        }
        if node.lazy_loading {
            flags.push("lazy");
        }
        if node.selected {
            flags.push("selected");
        }
        match node.check_state {
            CheckState::Checked => flags.push("checked"),
            CheckState::PartiallyChecked => flags.push("partial"),
            CheckState::Unchecked => {}
        }
        flags
    }
}

impl<T> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("has_loader", &self.loader.is_some())
            .field("projection", &self.projection)
            .finish()
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(current).and_then(|n| n.parent);
        Some(current)
    }
}
