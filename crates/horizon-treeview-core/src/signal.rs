//! Change notification for trees and their views.
//!
//! A [`Signal<Args>`] holds an ordered list of slots. [`Signal::emit`] calls
//! each of them with a borrowed argument, in the order they were connected,
//! before returning. Tree mutations happen on one thread, so there is no
//! queued or cross-thread delivery.
//!
//! The slot list is snapshotted before dispatch: a slot may connect or
//! disconnect slots on the signal that is calling it, and the change applies
//! from the next emission.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use horizon_treeview_core::Signal;
//!
//! let rows_removed = Signal::<(usize, usize)>::new();
//! let total = Arc::new(AtomicUsize::new(0));
//!
//! let sink = total.clone();
//! let id = rows_removed.connect(move |&(_, count)| {
//!     sink.fetch_add(count, Ordering::Relaxed);
//! });
//!
//! rows_removed.emit((4, 3));
//! rows_removed.disconnect(id);
//! rows_removed.emit((0, 10));
//! assert_eq!(total.load(Ordering::Relaxed), 3);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle for one connected slot, used to [`disconnect`](Signal::disconnect) it.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connections<Args> {
    ids: SlotMap<ConnectionId, ()>,
    /// Slots in connection order.
    slots: Vec<(ConnectionId, Slot<Args>)>,
}

/// A list of callbacks invoked with `&Args` on every emission.
///
/// Multi-value payloads are passed as tuples, e.g. `Signal<(usize, Vec<NodeId>)>`
/// for a row block.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                ids: SlotMap::with_key(),
                slots: Vec::new(),
            }),
        }
    }

    /// Append a slot. It runs after every slot connected before it.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.ids.insert(());
        connections.slots.push((id, Arc::new(slot)));
        id
    }

    /// Remove a slot. Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        if connections.ids.remove(id).is_none() {
            return false;
        }
        connections.slots.retain(|(slot_id, _)| *slot_id != id);
        true
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Call every connected slot with `args`.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self
            .connections
            .lock()
            .slots
            .iter()
            .map(|(_, slot)| slot.clone())
            .collect();
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");

        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().slots.len())
            .finish()
    }
}
