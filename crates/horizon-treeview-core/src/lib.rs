//! Core systems for Horizon TreeView.
//!
//! This crate provides the foundational pieces the tree view builds on:
//!
//! - **Signal/Slot System**: Type-safe change notification between the tree
//!   and the views that project it
//! - **Idle Queue**: One-shot continuations that run on the host's next idle tick
//! - **Logging**: Tracing targets, performance spans and a tree dump formatter
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_treeview_core::Signal;
//!
//! // Create a signal that reports inserted rows
//! let rows_inserted = Signal::<(usize, usize)>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = rows_inserted.connect(|(index, count)| {
//!     println!("{count} rows inserted at {index}");
//! });
//!
//! // Emit the signal
//! rows_inserted.emit((3, 2));
//!
//! // Disconnect when done
//! rows_inserted.disconnect(conn_id);
//! ```
//!
//! # Idle Queue Example
//!
//! ```
//! use horizon_treeview_core::IdleQueue;
//!
//! struct Viewport {
//!     offset: usize,
//! }
//!
//! let mut queue = IdleQueue::<Viewport>::new();
//! let mut viewport = Viewport { offset: 0 };
//!
//! queue.post(|v: &mut Viewport| v.offset = 40);
//! assert_eq!(viewport.offset, 0);
//!
//! // The host loop drains the queue once the current update completes
//! for task in queue.take_batch() {
//!     task.run(&mut viewport);
//! }
//! assert_eq!(viewport.offset, 40);
//! ```

pub mod logging;
pub mod signal;
mod task;

pub use logging::{DebugTree, PerfSpan, TreeFormatOptions, TreeFormatter, TreeStyle};
pub use signal::{ConnectionId, Signal};
pub use task::{IdleQueue, IdleTask, TaskId};
