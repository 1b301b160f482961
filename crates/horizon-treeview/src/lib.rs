//! Horizon TreeView - lazily populated trees flattened for virtualized lists.
//!
//! A [`Tree`] stores nodes in an arena and keeps, for every visible node, the
//! number of rows its subtree contributes. Attaching a root turns the visible
//! part of the hierarchy into an index-addressable list of rows that a
//! virtualizing list control can query by position, and every expansion,
//! hide or structural edit is reported as a single contiguous row change.
//!
//! - [`Tree`] - node arena, structural edits, visibility and row projection
//! - [`ChildLoader`] - one-shot provider for lazily loaded children
//! - [`CheckState`] - tri-state checkboxes cascading up and down the tree
//! - [`TreeView`] - viewport, deferred scrolling and selection follow-up
//! - [`value`] - reference provider over `serde_json` values
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
//! tree.add_child(a, "a2".to_string()).unwrap();
//! tree.add_child(root, "b".to_string()).unwrap();
//!
//! tree.attach(root, true).unwrap();
//! tree.set_expanded(root, true).unwrap();
//! assert_eq!(tree.count(), 3);
//!
//! tree.signals().rows_inserted.connect(|(index, nodes)| {
//!     assert_eq!((*index, nodes.len()), (2, 2));
//! });
//! tree.set_expanded(a, true).unwrap();
//! assert_eq!(tree.count(), 5);
//! ```

mod checkbox;
mod config;
mod error;
mod flattener;
mod lazy;
mod node;
mod tree;
pub mod value;
mod view;
mod visibility;

pub use checkbox::CheckState;
pub use config::TreeViewConfig;
pub use error::{ConfigError, LoadError, LoadResult, Result, TreeError};
pub use lazy::ChildLoader;
pub use node::{NodeId, NodeProperty, TreeNodeData};
pub use tree::{Ancestors, Tree, TreeSignals};
pub use view::TreeView;

pub use horizon_treeview_core::{ConnectionId, Signal, TreeFormatOptions, TreeFormatter, TreeStyle};
