//! Logging and debugging facilities for Horizon TreeView.
//!
//! This module provides:
//! - Integration with the `tracing` crate for structured logging
//! - Debug visualization for node trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Every event is emitted under one of the [`targets`], so a subscriber can
//! narrow output to a subsystem, e.g. `RUST_LOG=horizon_treeview::flattener=debug`
//! to watch row notifications. Recursive operations are wrapped in a
//! [`PerfSpan`] named after an entry in [`span_names`].
//!
//! # Debug Visualization
//!
//! Any hierarchy implementing [`DebugTree`] can be rendered with
//! [`TreeFormatter`]:
//!
//! ```ignore
//! use horizon_treeview_core::logging::TreeFormatter;
//!
//! let dump = TreeFormatter::new().format_subtree(&tree, root);
//! println!("{dump}");
//! ```

use std::fmt::{self, Write as FmtWrite};

/// Span names used throughout Horizon TreeView for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Visibility propagation span.
    pub const VISIBILITY: &str = "horizon_treeview::visibility";
    /// Lazy child loading span.
    pub const LAZY_LOAD: &str = "horizon_treeview::lazy_load";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_treeview_core::signal";
    /// Idle task queue target.
    pub const TASK: &str = "horizon_treeview_core::task";
    /// Node arena and structural edits.
    pub const TREE: &str = "horizon_treeview::tree";
    /// Visibility propagation and subtree-count cache.
    pub const VISIBILITY: &str = "horizon_treeview::visibility";
    /// Lazy child materialization.
    pub const LAZY: &str = "horizon_treeview::lazy";
    /// Tri-state checkbox cascade.
    pub const CHECKBOX: &str = "horizon_treeview::checkbox";
    /// Flattened projection and row notifications.
    pub const FLATTENER: &str = "horizon_treeview::flattener";
    /// Tree view controller.
    pub const VIEW: &str = "horizon_treeview::view";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show per-node state flags.
    pub show_flags: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_flags: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_flags: false,
            ..Default::default()
        }
    }
}

/// A hierarchy that can be rendered by [`TreeFormatter`].
pub trait DebugTree {
    /// Node identifier.
    type Id: Copy + fmt::Debug;

    /// Children of a node, in order.
    fn debug_children(&self, id: Self::Id) -> Vec<Self::Id>;

    /// The text shown for a node.
    fn debug_label(&self, id: Self::Id) -> String;

    /// Short state markers shown after the label (for example `expanded`).
    fn debug_flags(&self, _id: Self::Id) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Debug utility for visualizing node trees.
#[derive(Debug, Clone, Default)]
pub struct TreeFormatter {
    options: TreeFormatOptions,
}

impl TreeFormatter {
    /// Create a new formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree<T: DebugTree + ?Sized>(&self, tree: &T, root: T::Id) -> String {
        let mut output = String::new();
        // Explicit stack keeps pathological depths off the call stack.
        let mut stack = vec![(root, 0usize, true)];

        while let Some((id, depth, is_last)) = stack.pop() {
            if self.options.max_depth.is_some_and(|max| depth > max) {
                continue;
            }

            output.push_str(&self.build_prefix(depth, is_last));
            output.push_str(&tree.debug_label(id));

            if self.options.show_ids {
                let _ = write!(output, " [{:?}]", id);
            }

            if self.options.show_flags {
                let flags = tree.debug_flags(id);
                if !flags.is_empty() {
                    let _ = write!(output, " ({})", flags.join(", "));
                }
            }

            output.push('\n');

            let children = tree.debug_children(id);
            let child_count = children.len();
            for (i, child) in children.into_iter().enumerate().rev() {
                stack.push((child, depth + 1, i + 1 == child_count));
            }
        }

        output
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();

        // Add indentation for parent levels
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }

        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_treeview::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
