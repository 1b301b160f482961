//! Deferred task queue for idle processing.
//!
//! Tasks are one-shot continuations posted during a synchronous update and run
//! by the host loop on its next idle tick, after the update (and any layout it
//! triggered) has completed. Each task receives mutable access to a context
//! `C`, typically the view that posted it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::targets;

/// Identifies a posted task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed continuation.
type BoxedTask<C> = Box<dyn FnOnce(&mut C) + 'static>;

/// A pending continuation taken out of an [`IdleQueue`].
pub struct IdleTask<C> {
    id: TaskId,
    task: BoxedTask<C>,
}

impl<C> IdleTask<C> {
    /// The id this task was posted under.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Run the continuation against its context.
    pub fn run(self, context: &mut C) {
        tracing::trace!(target: targets::TASK, id = self.id.as_u64(), "running idle task");
        (self.task)(context);
    }
}

impl<C> fmt::Debug for IdleTask<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTask").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Queue of continuations waiting for the next idle tick.
///
/// The queue never runs tasks on its own. The owner drains it with
/// [`take_batch`](Self::take_batch) once it holds no outstanding borrows, then
/// runs each task with mutable access to itself. Tasks posted while a batch
/// runs are deferred to the following tick.
pub struct IdleQueue<C> {
    tasks: VecDeque<IdleTask<C>>,
    /// Upper bound on tasks handed out per tick.
    batch_size: usize,
}

impl<C> IdleQueue<C> {
    /// An empty queue handing out ten tasks per tick.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            batch_size: 10,
        }
    }

    /// An empty queue handing out at most `batch_size` tasks per tick.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            tasks: VecDeque::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Queue a continuation behind every pending one.
    pub fn post<F>(&mut self, task: F) -> TaskId
    where
        F: FnOnce(&mut C) + 'static,
    {
        let id = next_task_id();
        self.tasks.push_back(IdleTask {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::TASK, id = id.as_u64(), pending = self.tasks.len(), "posted idle task");
        id
    }

    /// Drop a task that has not been handed out yet.
    ///
    /// Returns `false` when the task already ran, was taken, or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tasks.remove(pos);
        tracing::trace!(target: targets::TASK, id = id.as_u64(), "cancelled idle task");
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Remove up to `batch_size` tasks, oldest first.
    pub fn take_batch(&mut self) -> Vec<IdleTask<C>> {
        let count = self.tasks.len().min(self.batch_size);
        self.tasks.drain(..count).collect()
    }

    /// Change the per-tick bound. Zero is treated as one.
    pub fn set_batch_size(&mut self, size: usize) {
        self.batch_size = size.max(1);
    }

    /// The number of tasks handed out per idle cycle.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl<C> Default for IdleQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for IdleQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleQueue")
            .field("pending", &self.tasks.len())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    #[test]
    fn test_tasks_run_in_post_order() {
        let mut queue = IdleQueue::<Log>::new();
        let mut log = Log::default();

        queue.post(|l: &mut Log| l.0.push("a"));
        queue.post(|l: &mut Log| l.0.push("b"));
        assert_eq!(queue.pending_count(), 2);

        for task in queue.take_batch() {
            task.run(&mut log);
        }
        assert_eq!(log.0, vec!["a", "b"]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_cancel() {
        let mut queue = IdleQueue::<Log>::new();
        let mut log = Log::default();

        let first = queue.post(|l: &mut Log| l.0.push("first"));
        queue.post(|l: &mut Log| l.0.push("second"));

        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));

        for task in queue.take_batch() {
            task.run(&mut log);
        }
        assert_eq!(log.0, vec!["second"]);
    }

    #[test]
    fn test_batch_size_limits_take() {
        let mut queue = IdleQueue::<Log>::with_batch_size(2);
        for _ in 0..5 {
            queue.post(|l: &mut Log| l.0.push("x"));
        }

        assert_eq!(queue.take_batch().len(), 2);
        assert_eq!(queue.pending_count(), 3);

        queue.set_batch_size(0);
        assert_eq!(queue.batch_size(), 1);
        assert_eq!(queue.take_batch().len(), 1);
    }

    #[test]
    fn test_task_ids_are_unique() {
        let mut queue = IdleQueue::<Log>::new();
        let a = queue.post(|_| {});
        let b = queue.post(|_| {});
        assert_ne!(a, b);

        let batch = queue.take_batch();
        assert_eq!(batch[0].id(), a);
        assert_eq!(batch[1].id(), b);
    }
}
