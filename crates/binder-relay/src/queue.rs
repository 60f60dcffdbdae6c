//! Generic priority work queue
//!
//! Items dequeue in ascending `(priority, sequence)` order: lower priority
//! values first, with a monotonic sequence number breaking ties so equal
//! priorities preserve enqueue order. [`WorkQueue::join`] resolves once every
//! enqueued item has been popped *and* acknowledged with
//! [`WorkQueue::task_done`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as MemOrdering};

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

/// One queued unit of work.
#[derive(Debug)]
pub struct WorkItem<T> {
    /// Lower dequeues first
    pub priority: u64,
    /// Assigned at enqueue time; breaks priority ties first-in-first-out
    pub seq: u64,
    pub payload: T,
}

impl<T> PartialEq for WorkItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for WorkItem<T> {}

impl<T> PartialOrd for WorkItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for WorkItem<T> {
    // reversed so the std max-heap pops the smallest (priority, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        (other.priority, other.seq).cmp(&(self.priority, self.seq))
    }
}

/// Priority queue with drain tracking.
pub struct WorkQueue<T> {
    heap: Mutex<BinaryHeap<WorkItem<T>>>,
    /// One permit per queued item
    items: Semaphore,
    seq: AtomicU64,
    /// Pushed but not yet acknowledged via `task_done`
    unfinished: AtomicUsize,
    drained: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            items: Semaphore::new(0),
            seq: AtomicU64::new(0),
            unfinished: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Enqueue a payload. Never blocks; the queue is unbounded.
    pub fn push(&self, payload: T, priority: u64) {
        let seq = self.seq.fetch_add(1, MemOrdering::Relaxed);
        self.unfinished.fetch_add(1, MemOrdering::SeqCst);
        self.heap.lock().push(WorkItem {
            priority,
            seq,
            payload,
        });
        self.items.add_permits(1);
    }

    /// Dequeue the lowest-(priority, sequence) item, waiting if the queue is
    /// empty.
    pub async fn pop(&self) -> WorkItem<T> {
        // the semaphore is never closed, and a permit guarantees an item
        let permit = self
            .items
            .acquire()
            .await
            .expect("work queue semaphore closed");
        permit.forget();
        self.heap
            .lock()
            .pop()
            .expect("work queue permit without item")
    }

    /// Acknowledge that a popped item has been fully processed.
    pub fn task_done(&self) {
        if self.unfinished.fetch_sub(1, MemOrdering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every enqueued item has been popped and acknowledged.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.unfinished.load(MemOrdering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
