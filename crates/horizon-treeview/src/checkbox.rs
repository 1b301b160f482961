//! Tri-state checkbox cascade.
//!
//! Checking a node pushes the value down to every checkable descendant, then
//! re-derives each checkable ancestor from its checkable children: all
//! checked gives `Checked`, all unchecked gives `Unchecked`, anything else
//! gives `PartiallyChecked`.
//!
//! An ancestor with no checkable children is not treated as vacuously
//! `Checked`. It keeps whatever state it was given, and the walk continues
//! upward from it, so a leaf under a non-checkable level never drags an
//! unrelated ancestor to `Checked` or `Unchecked`.

use horizon_treeview_core::logging::targets;

use crate::error::{Result, TreeError};
use crate::node::{NodeId, NodeProperty, TreeNodeData};
use crate::tree::Tree;

/// Checkbox state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckState {
    /// Node is unchecked.
    #[default]
    Unchecked,
    /// Some checkable children are checked and some are not.
    PartiallyChecked,
    /// Node is checked.
    Checked,
}

impl CheckState {
    /// Returns `true` if the node is fully checked.
    pub fn is_checked(&self) -> bool {
        matches!(self, CheckState::Checked)
    }

    /// `Some(bool)` for a definite state, `None` when mixed.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CheckState::Checked => Some(true),
            CheckState::Unchecked => Some(false),
            CheckState::PartiallyChecked => None,
        }
    }

    /// Toggles between Unchecked and Checked.
    /// PartiallyChecked becomes Checked.
    pub fn toggle(&self) -> CheckState {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            CheckState::Unchecked | CheckState::PartiallyChecked => CheckState::Checked,
        }
    }
}

impl From<bool> for CheckState {
    fn from(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

impl<T: TreeNodeData> Tree<T> {
    /// Check or uncheck a node and cascade the change.
    ///
    /// Returns `Ok(false)` when the node already had that state.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<bool> {
        let node = self.node(id)?;
        if !node.data.is_checkable() {
            return Err(TreeError::NotCheckable(id));
        }
        let value = CheckState::from(checked);
        if node.check_state == value {
            return Ok(false);
        }

        self.assign_check_state(id, value);

        let mut pushed = 0usize;
        let mut stack: Vec<NodeId> = self.nodes[id].children.clone();
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.data.is_checkable() && node.check_state != value {
                self.assign_check_state(current, value);
                pushed += 1;
            }
            stack.extend_from_slice(&self.nodes[current].children);
        }

        let parent = self.nodes[id].parent;
        if let Some(parent) = parent {
            self.rederive_check_states(parent);
        }

        tracing::debug!(target: targets::CHECKBOX, ?id, ?value, pushed, "check state cascaded");
        Ok(true)
    }

    /// Re-derive the check state of `start` and every ancestor above it.
    pub(crate) fn rederive_check_states(&mut self, start: NodeId) {
        let mut current = Some(start);
        while let Some(id) = current {
            if let Some(derived) = self.derived_check_state(id) {
                if self.nodes[id].check_state != derived {
                    self.assign_check_state(id, derived);
                }
            }
            current = self.nodes[id].parent;
        }
    }

    /// The state implied by the node's checkable children, if it is checkable
    /// and has any.
    fn derived_check_state(&self, id: NodeId) -> Option<CheckState> {
        let node = &self.nodes[id];
        if !node.data.is_checkable() {
            return None;
        }

        let mut states = node
            .children
            .iter()
            .map(|&c| &self.nodes[c])
            .filter(|c| c.data.is_checkable())
            .map(|c| c.check_state);

        let first = states.next()?;
        if states.all(|s| s == first) {
            Some(first)
        } else {
            Some(CheckState::PartiallyChecked)
        }
    }

    fn assign_check_state(&mut self, id: NodeId, state: CheckState) {
        self.nodes[id].check_state = state;
        tracing::trace!(target: targets::CHECKBOX, ?id, ?state, "check state assigned");
        self.emit_property(id, NodeProperty::CheckState);
    }
}
