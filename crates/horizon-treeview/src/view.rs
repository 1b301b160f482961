//! Tree view controller.
//!
//! [`TreeView`] binds a [`Tree`] to a scrolling viewport of fixed-height rows.
//! It owns the tree's projection, keeps selection consistent when rows
//! disappear, and defers "bring this node into view" work to the next idle
//! tick so it runs after the expansion that made the node a row.
//!
//! The host loop drives deferred work by calling
//! [`process_idle`](TreeView::process_idle) whenever it has nothing else to do.
//!
//! # Example
//!
//! ```
//! use horizon_treeview::{Tree, TreeView, TreeViewConfig};
//!
//! let mut tree = Tree::new();
//! let root = tree.create_node("root".to_string());
//! let leaves: Vec<_> = (0..100)
//!     .map(|i| tree.add_child(root, format!("leaf {i}")).unwrap())
//!     .collect();
//!
//! let mut view = TreeView::new(tree, TreeViewConfig::new().with_viewport_rows(10));
//! view.set_root(root).unwrap();
//!
//! view.scroll_into_view(leaves[50]).unwrap();
//! assert_eq!(view.scroll_offset(), 0); // nothing moves until the idle tick
//!
//! view.process_idle();
//! assert!(view.visible_range().contains(&51));
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use horizon_treeview_core::logging::targets;
use horizon_treeview_core::{ConnectionId, IdleQueue, TaskId};
use parking_lot::Mutex;

use crate::config::TreeViewConfig;
use crate::error::{Result, TreeError};
use crate::node::{NodeId, TreeNodeData};
use crate::tree::Tree;

/// A row notification recorded for replay after the edit that caused it.
#[derive(Debug)]
enum RowChange {
    Inserted { index: usize, nodes: Vec<NodeId> },
    Removed { index: usize, nodes: Vec<NodeId> },
}

type RowChanges = Arc<Mutex<Vec<RowChange>>>;

/// A tree bound to a virtualized viewport.
pub struct TreeView<T> {
    tree: Tree<T>,
    config: TreeViewConfig,
    idle: IdleQueue<TreeView<T>>,
    scroll_offset: usize,
    /// The scroll request that will run on the next idle tick.
    pending_scroll: Option<TaskId>,
    focused: Option<NodeId>,
    /// Row notifications not yet reconciled with selection and focus.
    row_changes: RowChanges,
    connections: [ConnectionId; 2],
}

impl<T: TreeNodeData + 'static> TreeView<T> {
    /// Wrap a tree. No projection exists until [`set_root`](Self::set_root).
    pub fn new(tree: Tree<T>, config: TreeViewConfig) -> Self {
        let row_changes: RowChanges = Arc::new(Mutex::new(Vec::new()));
        let signals = tree.signals();
        let sink = row_changes.clone();
        let inserted = signals.rows_inserted.connect(move |(index, nodes)| {
            sink.lock().push(RowChange::Inserted {
                index: *index,
                nodes: nodes.clone(),
            });
        });
        let sink = row_changes.clone();
        let removed = signals.rows_removed.connect(move |(index, nodes)| {
            sink.lock().push(RowChange::Removed {
                index: *index,
                nodes: nodes.clone(),
            });
        });

        Self {
            tree,
            idle: IdleQueue::with_batch_size(config.idle_batch_size),
            config,
            scroll_offset: 0,
            pending_scroll: None,
            focused: None,
            row_changes,
            connections: [inserted, removed],
        }
    }

    pub fn tree(&self) -> &Tree<T> {
        &self.tree
    }

    /// Mutable access to the tree. Row removals made through it are
    /// reconciled on the next view operation or idle tick.
    pub fn tree_mut(&mut self) -> &mut Tree<T> {
        &mut self.tree
    }

    /// Consume the view, returning the tree with its projection detached.
    pub fn into_tree(mut self) -> Tree<T> {
        self.tree.detach();
        let [inserted, removed] = self.connections;
        self.tree.signals().rows_inserted.disconnect(inserted);
        self.tree.signals().rows_removed.disconnect(removed);
        self.tree
    }

    pub fn config(&self) -> &TreeViewConfig {
        &self.config
    }

    /// The projected root.
    pub fn root(&self) -> Option<NodeId> {
        self.tree.projection_root()
    }

    /// The node that last received focus.
    pub fn focused_node(&self) -> Option<NodeId> {
        self.focused
    }

    /// Display `root`, replacing whatever was shown before.
    ///
    /// Unless the root is shown with its own expander it is expanded, since
    /// the user would otherwise have no way to open it.
    pub fn set_root(&mut self, root: NodeId) -> Result<()> {
        if self.tree.parent(root)?.is_some() {
            return Err(TreeError::NotARoot(root));
        }

        self.tree.detach();
        if let Some(task) = self.pending_scroll.take() {
            self.idle.cancel(task);
        }
        if !(self.config.show_root && self.config.show_root_expander) {
            self.tree.set_expanded(root, true)?;
        }
        self.tree.attach(root, self.config.show_root)?;

        self.scroll_offset = 0;
        self.focused = None;
        self.row_changes.lock().clear();
        tracing::debug!(target: targets::VIEW, ?root, rows = self.tree.count(), "root set");
        Ok(())
    }

    /// Expand or collapse a node.
    ///
    /// Expanding scrolls so the new children are in view while keeping the
    /// node itself on screen.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        let changed = self.tree.set_expanded(id, expanded)?;
        if changed && expanded {
            self.handle_expanding(id);
        }
        self.sync_row_changes();
        Ok(changed)
    }

    /// Hide or unhide a node.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<bool> {
        let changed = self.tree.set_hidden(id, hidden)?;
        self.sync_row_changes();
        Ok(changed)
    }

    /// Check or uncheck a node. Ignored unless checkboxes are enabled.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<bool> {
        if !self.config.checkboxes {
            tracing::trace!(target: targets::VIEW, ?id, "checkboxes disabled, ignoring toggle");
            return Ok(false);
        }
        self.tree.set_checked(id, checked)
    }

    /// Expand the node and its descendants, stopping at any node that does
    /// not allow recursive expansion.
    ///
    /// A refusing node keeps its whole subtree untouched. Lazy nodes always
    /// refuse, so this never triggers a load.
    pub fn expand_recursively(&mut self, id: NodeId) -> Result<()> {
        self.tree.node(id)?;
        let mut stack = vec![id];
        let mut expanded = 0usize;
        while let Some(node) = stack.pop() {
            if !self.tree.can_expand_recursively(node) {
                continue;
            }
            if self.tree.set_expanded(node, true)? {
                expanded += 1;
            }
            stack.extend(self.tree.children(node)?.iter().rev().copied());
        }
        tracing::debug!(target: targets::VIEW, ?id, expanded, "expanded recursively");
        self.sync_row_changes();
        Ok(())
    }

    /// Make `id` a row and scroll it into the viewport on the next idle tick.
    ///
    /// Every collapsed ancestor is expanded immediately. The scroll itself is
    /// deferred; a later request supersedes one that has not run yet.
    pub fn scroll_into_view(&mut self, id: NodeId) -> Result<()> {
        self.expand_ancestors(id)?;
        self.request_scroll(id);
        self.sync_row_changes();
        Ok(())
    }

    /// Scroll `id` into view, then focus and select it once the scroll ran.
    pub fn focus_node(&mut self, id: NodeId) -> Result<()> {
        self.scroll_into_view(id)?;
        self.idle.post(move |view: &mut TreeView<T>| view.apply_focus(id));
        Ok(())
    }

    /// Run the continuations queued for this idle tick.
    ///
    /// Returns the number of continuations that ran.
    pub fn process_idle(&mut self) -> usize {
        let batch = self.idle.take_batch();
        let ran = batch.len();
        for task in batch {
            task.run(self);
        }
        self.sync_row_changes();
        if ran > 0 {
            tracing::trace!(target: targets::VIEW, ran, pending = self.idle.pending_count(), "processed idle tasks");
        }
        ran
    }

    /// Whether deferred work is waiting for an idle tick.
    pub fn has_pending_work(&self) -> bool {
        self.idle.has_pending()
    }

    pub fn viewport_rows(&self) -> usize {
        self.config.viewport_rows
    }

    /// Resize the viewport.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.config.viewport_rows = rows;
        self.clamp_scroll();
    }

    /// Index of the first row in the viewport.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Scroll to a row offset, clamped to the scrollable range.
    pub fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset;
        self.clamp_scroll();
    }

    /// Rows currently inside the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.config.viewport_rows).min(self.tree.count());
        self.scroll_offset.min(end)..end
    }

    /// Nodes currently inside the viewport, in row order.
    pub fn visible_rows(&self) -> Vec<NodeId> {
        self.visible_range()
            .filter_map(|i| self.tree.node_at(i))
            .collect()
    }

    fn expand_ancestors(&mut self, id: NodeId) -> Result<()> {
        self.tree.node(id)?;
        let root = self.tree.projection_root().ok_or(TreeError::NotVisible(id))?;
        let mut chain: Vec<NodeId> = self.tree.ancestors(id).collect();

        let under_root = chain.last().copied().unwrap_or(id) == root;
        let is_hidden_root = id == root && !self.tree.includes_root();
        let blocked = self.tree.is_hidden(id) || chain.iter().any(|&a| self.tree.is_hidden(a));
        if !under_root || is_hidden_root || blocked {
            return Err(TreeError::NotVisible(id));
        }

        chain.reverse();
        for ancestor in chain {
            self.tree.set_expanded(ancestor, true)?;
        }
        Ok(())
    }

    fn request_scroll(&mut self, id: NodeId) {
        if let Some(previous) = self.pending_scroll.take() {
            self.idle.cancel(previous);
        }
        let task = self.idle.post(move |view: &mut TreeView<T>| {
            view.pending_scroll = None;
            view.reveal(id);
        });
        self.pending_scroll = Some(task);
    }

    /// Scroll the minimum distance that puts `id`'s row in the viewport.
    fn reveal(&mut self, id: NodeId) {
        let Some(row) = self.tree.index_of(id) else {
            return;
        };
        let rows = self.config.viewport_rows.max(1);
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + rows {
            self.scroll_offset = row + 1 - rows;
        }
        tracing::trace!(target: targets::VIEW, ?id, row, offset = self.scroll_offset, "revealed row");
    }

    /// Show the expanded node's last visible descendant now, then bring the
    /// node itself back into view on the next idle tick.
    fn handle_expanding(&mut self, id: NodeId) {
        if self.tree.index_of(id).is_none() {
            return;
        }
        let mut last = id;
        while let Some(child) = self
            .tree
            .children(last)
            .ok()
            .and_then(|c| c.iter().rev().copied().find(|&c| self.tree.is_visible(c)))
        {
            last = child;
        }
        if last != id {
            self.reveal(last);
            self.request_scroll(id);
        }
    }

    fn apply_focus(&mut self, id: NodeId) {
        if self.tree.index_of(id).is_none() {
            return;
        }
        if self.tree.set_selected(id, true).is_ok() {
            self.focused = Some(id);
            tracing::debug!(target: targets::VIEW, ?id, "focused node");
        }
    }

    /// Replay row notifications in the order they fired: deselect removed
    /// nodes and move focus to the row before the block that took it away.
    ///
    /// The fallback row is tracked through every later notification, so it
    /// names the same row once the whole batch has been applied.
    fn sync_row_changes(&mut self) {
        let changes = std::mem::take(&mut *self.row_changes.lock());
        let mut fallback: Option<usize> = None;

        for change in changes {
            match change {
                RowChange::Inserted { index, nodes } => {
                    if self.focused.is_some_and(|f| nodes.contains(&f)) {
                        fallback = None;
                    } else if let Some(row) = fallback.as_mut() {
                        if *row >= index {
                            *row += nodes.len();
                        }
                    }
                }
                RowChange::Removed { index, nodes } => {
                    for &id in &nodes {
                        if !self.tree.is_selected(id) {
                            continue;
                        }
                        if let Err(err) = self.tree.set_selected(id, false) {
                            tracing::warn!(target: targets::VIEW, ?id, error = %err, "could not deselect removed row");
                        }
                    }

                    let end = index + nodes.len();
                    fallback = match fallback {
                        Some(row) if row >= end => Some(row - nodes.len()),
                        Some(row) if row >= index => Some(index.saturating_sub(1)),
                        other => other,
                    };
                    if self.focused.is_some_and(|f| nodes.contains(&f)) {
                        fallback = Some(index.saturating_sub(1));
                    }
                }
            }
        }

        if let Some(row) = fallback {
            let from = self.focused;
            self.focused = self.tree.node_at(row);
            if let Some(next) = self.focused {
                if let Err(err) = self.tree.set_selected(next, true) {
                    tracing::warn!(target: targets::VIEW, ?next, error = %err, "could not select fallback row");
                }
            }
            tracing::debug!(target: targets::VIEW, ?from, row, to = ?self.focused, "focus moved after removal");
        }
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.tree.count().saturating_sub(self.config.viewport_rows);
        self.scroll_offset = self.scroll_offset.min(max);
    }
}

impl<T> fmt::Debug for TreeView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("tree", &self.tree)
            .field("config", &self.config)
            .field("scroll_offset", &self.scroll_offset)
            .field("pending_scroll", &self.pending_scroll)
            .field("focused", &self.focused)
            .field("idle", &self.idle)
            .finish()
    }
}
