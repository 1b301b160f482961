//! Node identity, payload trait and per-node state.

use std::cell::Cell;

use slotmap::new_key_type;

use crate::checkbox::CheckState;

new_key_type! {
    /// A unique identifier for a node in a [`Tree`](crate::Tree).
    ///
    /// IDs are generational: once a node is removed its ID never resolves
    /// again, even if the slot is reused.
    pub struct NodeId;
}

/// Payload carried by every node.
///
/// The payload decides what a node looks like to the user and which
/// interactions it supports. Everything else (hierarchy, expansion,
/// visibility, check state) is owned by the tree.
///
/// # Example
///
/// ```
/// use horizon_treeview::TreeNodeData;
///
/// struct Task {
///     title: String,
///     done: bool,
/// }
///
/// impl TreeNodeData for Task {
///     fn text(&self) -> String {
///         self.title.clone()
///     }
///
///     fn is_checkable(&self) -> bool {
///         true
///     }
/// }
/// ```
pub trait TreeNodeData {
    /// Display text for the node's row.
    fn text(&self) -> String;

    /// Whether the node carries a tri-state checkbox.
    fn is_checkable(&self) -> bool {
        false
    }

    /// Whether the node's text can be edited in place.
    fn is_editable(&self) -> bool {
        false
    }
}

impl TreeNodeData for String {
    fn text(&self) -> String {
        self.clone()
    }
}

impl TreeNodeData for &'static str {
    fn text(&self) -> String {
        (*self).to_string()
    }
}

/// A per-node property reported through
/// [`TreeSignals::property_changed`](crate::TreeSignals::property_changed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    Hidden,
    Expanded,
    Selected,
    Editing,
    CheckState,
    LazyLoading,
    CanExpandRecursively,
    /// Whether [`Tree::show_expander`](crate::Tree::show_expander) may have
    /// changed its answer.
    ShowExpander,
}

/// Internal storage for a single node.
pub(crate) struct TreeNode<T> {
    pub(crate) data: T,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) hidden: bool,
    pub(crate) visible: bool,
    pub(crate) expanded: bool,
    pub(crate) selected: bool,
    pub(crate) editing: bool,
    pub(crate) check_state: CheckState,
    pub(crate) lazy_loading: bool,
    pub(crate) can_expand_recursively: bool,
    /// Rows contributed by this node and its visible descendants while the
    /// node is visible. `None` when stale.
    pub(crate) subtree_count: Cell<Option<usize>>,
}

impl<T> TreeNode<T> {
    /// A detached node: no parent, so visible unless hidden.
    pub(crate) fn new(data: T) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            hidden: false,
            visible: true,
            expanded: false,
            selected: false,
            editing: false,
            check_state: CheckState::default(),
            lazy_loading: false,
            can_expand_recursively: true,
            subtree_count: Cell::new(None),
        }
    }

    /// Whether the node's children are candidates for rows.
    pub(crate) fn shows_children(&self) -> bool {
        self.visible && self.expanded
    }
}
