//! Visibility propagation and the visible-subtree-count cache.
//!
//! A parentless node is visible unless hidden. A child is visible when its
//! parent is visible and expanded and the child itself is not hidden.
//!
//! Every visible node caches the number of rows it contributes (itself plus
//! its visible descendants). When a node's visibility flips, its cache and
//! those of its ancestors are marked stale, stopping at the first ancestor
//! that is already stale. A stale visible node therefore always has stale
//! ancestors, which is what makes the early stop sound. Reads recompute
//! stale entries on demand.

use horizon_treeview_core::PerfSpan;
use horizon_treeview_core::logging::{span_names, targets};

use crate::error::Result;
use crate::node::{NodeId, NodeProperty, TreeNodeData};
use crate::tree::Tree;

impl<T: TreeNodeData> Tree<T> {
    /// Hide or unhide a node. Returns whether the flag changed.
    ///
    /// Rows that appear or disappear are reported as one notification.
    /// Hiding a node that is not visible only updates the flag.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<bool> {
        let node = self.node(id)?;
        if node.hidden == hidden {
            return Ok(false);
        }

        let before = self.rows_from(id);
        self.nodes[id].hidden = hidden;
        self.emit_property(id, NodeProperty::Hidden);

        let parent = self.nodes[id].parent;
        if let Some(parent) = parent {
            self.emit_property(parent, NodeProperty::ShowExpander);
        }
        let parent_shows = match parent {
            Some(parent) => self.nodes[parent].shows_children(),
            None => true,
        };
        self.propagate_visibility(vec![(id, parent_shows)]);

        let after = self.rows_from(id);
        tracing::debug!(target: targets::VISIBILITY, ?id, hidden, "hidden flag changed");
        self.notify_rows_removed(before);
        self.notify_rows_inserted(after);
        Ok(true)
    }

    /// Expand or collapse a node. Returns whether the flag changed.
    ///
    /// Expanding a lazy node materializes its children first, so they appear
    /// together with the expansion in a single notification.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        if self.node(id)?.expanded == expanded {
            return Ok(false);
        }
        if expanded {
            self.ensure_children_loaded(id)?;
            // A provider may expand the node itself while loading.
            if self.node(id)?.expanded {
                return Ok(false);
            }
        }

        let before = self.rows_below(id);
        self.nodes[id].expanded = expanded;
        self.emit_property(id, NodeProperty::Expanded);

        self.propagate_to_children(id);

        let after = self.rows_below(id);
        tracing::debug!(target: targets::VISIBILITY, ?id, expanded, "expansion changed");
        self.notify_rows_removed(before);
        self.notify_rows_inserted(after);
        Ok(true)
    }

    /// Re-evaluate the children of `id` against its current state.
    fn propagate_to_children(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let shows = node.shows_children();
        let seeds = node.children.iter().map(|&c| (c, shows)).collect();
        self.propagate_visibility(seeds);
    }

    /// Apply the visibility rule to each seed given whether its parent shows
    /// children, descending only where a node's visibility actually flipped
    /// and its children therefore see a different parent condition.
    pub(crate) fn propagate_visibility(&mut self, seeds: Vec<(NodeId, bool)>) {
        let _span = PerfSpan::new(span_names::VISIBILITY);
        let mut stack = seeds;
        let mut flipped = 0usize;

        while let Some((id, parent_shows)) = stack.pop() {
            let node = &mut self.nodes[id];
            let visible = parent_shows && !node.hidden;
            if node.visible == visible {
                continue;
            }
            node.visible = visible;
            flipped += 1;
            let expanded = node.expanded;
            tracing::trace!(target: targets::VISIBILITY, ?id, visible, "visibility flipped");

            self.mark_stale(id);

            // Collapsed nodes hide their children either way.
            if expanded {
                let shows = visible;
                stack.extend(self.nodes[id].children.iter().map(|&c| (c, shows)));
            }
        }

        if flipped > 0 {
            tracing::trace!(target: targets::VISIBILITY, flipped, "propagated visibility");
        }
    }

    /// Mark the node's own count stale, then its ancestors.
    fn mark_stale(&self, id: NodeId) {
        let node = &self.nodes[id];
        node.subtree_count.set(None);
        self.invalidate_upward(node.parent);
    }

    /// Mark `start` and its ancestors stale, stopping at the first one that
    /// already is.
    pub(crate) fn invalidate_upward(&self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if node.subtree_count.get().is_none() {
                break;
            }
            node.subtree_count.set(None);
            current = node.parent;
        }
    }

    /// Rows contributed by the node: itself plus its visible descendants, or
    /// zero when it is not visible.
    pub fn visible_subtree_count(&self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };
        if !node.visible {
            return 0;
        }
        if let Some(count) = node.subtree_count.get() {
            return count;
        }

        // Post-order over stale visible nodes only.
        let mut stack = vec![(id, false)];
        while let Some((current, children_done)) = stack.pop() {
            let node = &self.nodes[current];
            if children_done {
                let total = 1 + node
                    .children
                    .iter()
                    .map(|&c| self.cached_count(c))
                    .sum::<usize>();
                node.subtree_count.set(Some(total));
                continue;
            }
            stack.push((current, true));
            for &child in &node.children {
                let child_node = &self.nodes[child];
                if child_node.visible && child_node.subtree_count.get().is_none() {
                    stack.push((child, false));
                }
            }
        }

        self.cached_count(id)
    }

    fn cached_count(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        if node.visible {
            node.subtree_count.get().unwrap_or(0)
        } else {
            0
        }
    }

    /// The node (optionally) and its visible descendants, in pre-order.
    pub(crate) fn visible_preorder(&self, id: NodeId, include_self: bool) -> Vec<NodeId> {
        let mut result = Vec::new();
        let node = &self.nodes[id];
        if !node.visible {
            return result;
        }

        let mut stack = Vec::new();
        if include_self {
            stack.push(id);
        } else {
            stack.extend(node.children.iter().rev().filter(|&&c| self.nodes[c].visible));
        }
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(
                self.nodes[current]
                    .children
                    .iter()
                    .rev()
                    .filter(|&&c| self.nodes[c].visible),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::{NodeId, NodeProperty, Tree};

    /// root
    /// ├── a
    /// │   ├── a1
    /// │   └── a2
    /// └── b
    fn sample() -> (Tree<String>, [NodeId; 5]) {
        let mut tree = Tree::new();
        let root = tree.create_node("root".into());
        let a = tree.add_child(root, "a".into()).unwrap();
        let a1 = tree.add_child(a, "a1".into()).unwrap();
        let a2 = tree.add_child(a, "a2".into()).unwrap();
        let b = tree.add_child(root, "b".into()).unwrap();
        (tree, [root, a, a1, a2, b])
    }

    fn naive_visible(tree: &Tree<String>, id: NodeId) -> bool {
        if tree.is_hidden(id) {
            return false;
        }
        match tree.parent(id).unwrap() {
            None => true,
            Some(p) => naive_visible(tree, p) && tree.is_expanded(p),
        }
    }

    fn assert_visibility_rule(tree: &Tree<String>, nodes: &[NodeId]) {
        for &id in nodes {
            assert_eq!(tree.is_visible(id), naive_visible(tree, id), "node {id:?}");
        }
    }

    #[test]
    fn test_detached_nodes_are_visible() {
        let mut tree: Tree<String> = Tree::new();
        let lone = tree.create_node("lone".into());
        assert!(tree.is_visible(lone));
        assert_eq!(tree.visible_subtree_count(lone), 1);

        tree.set_hidden(lone, true).unwrap();
        assert!(!tree.is_visible(lone));
        assert_eq!(tree.visible_subtree_count(lone), 0);
    }

    #[test]
    fn test_expand_reveals_children() {
        let (mut tree, [root, a, a1, a2, b]) = sample();
        let all = [root, a, a1, a2, b];
        assert_visibility_rule(&tree, &all);
        assert_eq!(tree.visible_subtree_count(root), 1);

        tree.set_expanded(root, true).unwrap();
        assert_visibility_rule(&tree, &all);
        assert_eq!(tree.visible_subtree_count(root), 3);

        tree.set_expanded(a, true).unwrap();
        assert_visibility_rule(&tree, &all);
        assert_eq!(tree.visible_subtree_count(root), 5);
        assert_eq!(tree.visible_subtree_count(a), 3);
    }

    #[test]
    fn test_collapse_keeps_nested_expansion() {
        let (mut tree, [root, a, a1, a2, b]) = sample();
        tree.set_expanded(root, true).unwrap();
        tree.set_expanded(a, true).unwrap();

        tree.set_expanded(root, false).unwrap();
        assert!(tree.is_expanded(a));
        assert!(!tree.is_visible(a1));
        assert_eq!(tree.visible_subtree_count(root), 1);

        tree.set_expanded(root, true).unwrap();
        assert!(tree.is_visible(a1));
        assert_eq!(tree.visible_subtree_count(root), 5);
        assert_visibility_rule(&tree, &[root, a, a1, a2, b]);
    }

    #[test]
    fn test_hiding_child_reports_parent_expander() {
        let (mut tree, [root, a, a1, a2, _]) = sample();
        let events = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = events.clone();
        tree.signals()
            .property_changed
            .connect(move |&(id, prop)| sink.lock().push((id, prop)));

        tree.set_hidden(a1, true).unwrap();
        assert_eq!(
            *events.lock(),
            vec![(a1, NodeProperty::Hidden), (a, NodeProperty::ShowExpander)]
        );

        tree.set_hidden(a2, true).unwrap();
        assert!(!tree.show_expander(a));
        events.lock().clear();

        tree.set_hidden(root, true).unwrap();
        assert_eq!(*events.lock(), vec![(root, NodeProperty::Hidden)]);
    }

    #[test]
    fn test_hide_subtracts_whole_subtree() {
        let (mut tree, [root, a, a1, a2, b]) = sample();
        tree.set_expanded(root, true).unwrap();
        tree.set_expanded(a, true).unwrap();

        tree.set_hidden(a, true).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 2);
        assert_visibility_rule(&tree, &[root, a, a1, a2, b]);

        tree.set_hidden(a, false).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 5);
    }

    #[test]
    fn test_hide_invisible_node_only_sets_flag() {
        let (mut tree, [root, a, a1, ..]) = sample();

        assert!(tree.set_hidden(a1, true).unwrap());
        assert!(tree.is_hidden(a1));

        tree.set_expanded(root, true).unwrap();
        tree.set_expanded(a, true).unwrap();
        assert!(!tree.is_visible(a1));
        assert_eq!(tree.visible_subtree_count(root), 4);
    }

    #[test]
    fn test_insert_under_collapsed_parent_keeps_counts() {
        let (mut tree, [root, a, ..]) = sample();
        tree.set_expanded(root, true).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 3);

        let extra = tree.add_child(a, "a3".into()).unwrap();
        assert!(!tree.is_visible(extra));
        assert_eq!(tree.visible_subtree_count(root), 3);

        tree.set_expanded(a, true).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 6);
    }

    #[test]
    fn test_insert_and_remove_update_counts() {
        let (mut tree, [root, a, a1, ..]) = sample();
        tree.set_expanded(root, true).unwrap();
        tree.set_expanded(a, true).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 5);

        let subtree = tree.create_node("x".into());
        tree.add_child(subtree, "x1".into()).unwrap();
        tree.set_expanded(subtree, true).unwrap();
        assert_eq!(tree.visible_subtree_count(subtree), 2);

        tree.append_child(a, subtree).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 7);

        tree.remove_children(a, &[a1]).unwrap();
        assert_eq!(tree.visible_subtree_count(root), 6);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut tree: Tree<String> = Tree::new();
        let root = tree.create_node("n0".into());
        let mut last = root;
        for i in 1..10_000 {
            tree.set_expanded(last, true).unwrap();
            last = tree.add_child(last, format!("n{i}")).unwrap();
        }

        assert!(tree.is_visible(last));
        assert_eq!(tree.visible_subtree_count(root), 10_000);

        tree.set_expanded(root, false).unwrap();
        assert!(!tree.is_visible(last));
        assert_eq!(tree.visible_subtree_count(root), 1);
    }
}
