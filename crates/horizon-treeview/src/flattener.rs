//! Flattened, index-addressable projection of a hierarchy.
//!
//! Attaching a parentless node turns its visible subtree into a list of rows
//! in pre-order. Positions are derived from the cached visible-subtree counts,
//! so [`Tree::index_of`] and [`Tree::node_at`] cost O(depth × branching) and
//! no row array is ever materialized.
//!
//! While attached, the tree reports every change of the row list through
//! [`TreeSignals::rows_inserted`](crate::TreeSignals::rows_inserted) and
//! [`TreeSignals::rows_removed`](crate::TreeSignals::rows_removed). Applying
//! those notifications in order to a mirror list reproduces the projection.
//!
//! # Example
//!
//! ```
//! use horizon_treeview::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.create_node("root".to_string());
//! let a = tree.add_child(root, "a".to_string()).unwrap();
//! tree.add_child(a, "a1".to_string()).unwrap();
//!
//! tree.attach(root, false).unwrap(); // expands the hidden root
//! assert_eq!(tree.count(), 1);
//!
//! tree.set_expanded(a, true).unwrap();
//! assert_eq!(tree.count(), 2);
//! assert_eq!(tree.index_of(a), Some(0));
//! assert_eq!(tree.node_at(1).map(|n| tree.text(n).unwrap()), Some("a1".to_string()));
//! ```

use horizon_treeview_core::logging::targets;

use crate::error::{Result, TreeError};
use crate::node::{NodeId, TreeNodeData};
use crate::tree::Tree;

/// The attached projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Projection {
    pub(crate) root: NodeId,
    pub(crate) include_root: bool,
}

/// A contiguous block of rows, positioned as if the root were always a row.
pub(crate) struct RowBlock {
    position: usize,
    nodes: Vec<NodeId>,
}

impl<T: TreeNodeData> Tree<T> {
    /// Project the subtree under `root` into rows.
    ///
    /// With `include_root` false the root itself is not a row and is expanded
    /// if collapsed. Attaching replaces any previous projection.
    pub fn attach(&mut self, root: NodeId, include_root: bool) -> Result<()> {
        if let Some(parent) = self.node(root)?.parent {
            tracing::debug!(target: targets::FLATTENER, ?root, ?parent, "refusing to attach a child node");
            return Err(TreeError::NotARoot(root));
        }
        self.detach();
        if !include_root {
            self.set_expanded(root, true)?;
        }
        self.projection = Some(Projection { root, include_root });
        tracing::debug!(target: targets::FLATTENER, ?root, include_root, rows = self.count(), "attached projection");
        Ok(())
    }

    /// Stop projecting. Idempotent.
    pub fn detach(&mut self) {
        if let Some(projection) = self.projection.take() {
            tracing::debug!(target: targets::FLATTENER, root = ?projection.root, "detached projection");
        }
    }

    /// The root of the attached projection.
    pub fn projection_root(&self) -> Option<NodeId> {
        self.projection.map(|p| p.root)
    }

    /// Whether the projection's root is a row.
    pub fn includes_root(&self) -> bool {
        self.projection.is_some_and(|p| p.include_root)
    }

    /// Number of rows in the projection.
    pub fn count(&self) -> usize {
        let Some(projection) = self.projection else {
            return 0;
        };
        let total = self.visible_subtree_count(projection.root);
        if projection.include_root {
            total
        } else {
            total.saturating_sub(1)
        }
    }

    /// The row of `id`, or `None` when it is not a row of the projection.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let projection = self.projection?;
        if !self.nodes.get(id)?.visible {
            return None;
        }
        let position = self.position_of(id)?;
        if projection.include_root {
            Some(position)
        } else {
            position.checked_sub(1)
        }
    }

    /// The node at row `index`.
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        let projection = self.projection?;
        let mut remaining = if projection.include_root {
            index
        } else {
            index.checked_add(1)?
        };
        if remaining >= self.visible_subtree_count(projection.root) {
            return None;
        }

        let mut current = projection.root;
        'descend: loop {
            if remaining == 0 {
                return Some(current);
            }
            remaining -= 1;
            for &child in &self.nodes[current].children {
                let rows = self.visible_subtree_count(child);
                if remaining < rows {
                    current = child;
                    continue 'descend;
                }
                remaining -= rows;
            }
            // Counts and children disagree; only reachable through a bug.
            tracing::warn!(target: targets::FLATTENER, index, "row lookup ran past the subtree");
            return None;
        }
    }

    /// Every row, in order.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let Some(projection) = self.projection else {
            return Vec::new();
        };
        self.visible_preorder(projection.root, projection.include_root)
    }

    /// Position of `id` counting the root as row 0, assuming every ancestor
    /// is visible. Holds for an invisible `id` too: it is the slot the node
    /// would occupy. `None` unless `id` is under the projection root.
    fn position_of(&self, id: NodeId) -> Option<usize> {
        let root = self.projection?.root;
        let mut position = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            for &sibling in &self.nodes[parent].children {
                if sibling == current {
                    break;
                }
                position += self.visible_subtree_count(sibling);
            }
            position += 1;
            current = parent;
        }
        (current == root).then_some(position)
    }

    /// Whether `id` belongs to the projected hierarchy.
    fn is_projected(&self, id: NodeId) -> bool {
        self.projection.is_some_and(|p| self.root_of(id) == p.root)
    }

    /// Rows of `id` and its visible descendants.
    pub(crate) fn rows_from(&self, id: NodeId) -> Option<RowBlock> {
        if !self.nodes[id].visible || !self.is_projected(id) {
            return None;
        }
        Some(RowBlock {
            position: self.position_of(id)?,
            nodes: self.visible_preorder(id, true),
        })
    }

    /// Rows of the visible descendants of `id`.
    pub(crate) fn rows_below(&self, id: NodeId) -> Option<RowBlock> {
        if !self.nodes[id].shows_children() || !self.is_projected(id) {
            return None;
        }
        Some(RowBlock {
            position: self.position_of(id)? + 1,
            nodes: self.visible_preorder(id, false),
        })
    }

    /// Rows of a contiguous run of `parent`'s children.
    pub(crate) fn rows_of_run(&self, parent: NodeId, run: &[NodeId]) -> Option<RowBlock> {
        let first = *run.first()?;
        if !self.nodes[parent].shows_children() || !self.is_projected(parent) {
            return None;
        }
        Some(RowBlock {
            position: self.position_of(first)?,
            nodes: run
                .iter()
                .flat_map(|&id| self.visible_preorder(id, true))
                .collect(),
        })
    }

    /// Convert a block to projection indices, dropping an excluded root.
    fn to_rows(&self, block: Option<RowBlock>) -> Option<(usize, Vec<NodeId>)> {
        let RowBlock {
            position,
            mut nodes,
        } = block?;
        let projection = self.projection?;
        let index = if projection.include_root {
            position
        } else if position == 0 {
            nodes.retain(|&n| n != projection.root);
            0
        } else {
            position - 1
        };
        (!nodes.is_empty()).then_some((index, nodes))
    }

    pub(crate) fn notify_rows_inserted(&self, block: Option<RowBlock>) {
        if let Some((index, nodes)) = self.to_rows(block) {
            tracing::debug!(target: targets::FLATTENER, index, count = nodes.len(), "rows inserted");
            self.signals.rows_inserted.emit((index, nodes));
        }
    }

    pub(crate) fn notify_rows_removed(&self, block: Option<RowBlock>) {
        if let Some((index, nodes)) = self.to_rows(block) {
            tracing::debug!(target: targets::FLATTENER, index, count = nodes.len(), "rows removed");
            self.signals.rows_removed.emit((index, nodes));
        }
    }
}
