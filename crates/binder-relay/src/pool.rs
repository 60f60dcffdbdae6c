//! Worker pool over a [`WorkQueue`]
//!
//! N tokio tasks each loop: pop one item, invoke the handler, acknowledge.
//! A handler error is logged and the item dropped; it never terminates the
//! worker or the pool. [`WorkerPool::finish`] blocks until the queue is fully
//! drained, then cancels every worker and awaits the cancellations, so no
//! item is silently dropped mid-flight and no execution dangles.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::RelayResult;
use crate::queue::WorkQueue;

/// Processes one work item payload at a time.
#[async_trait]
pub trait WorkHandler<T>: Send + Sync {
    async fn handle(&self, payload: T) -> RelayResult<()>;
}

/// A fixed-size pool of worker tasks consuming a shared queue.
pub struct WorkerPool<T> {
    queue: Arc<WorkQueue<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `num_workers` consumers. Must be called within a tokio runtime.
    pub fn start(
        queue: Arc<WorkQueue<T>>,
        handler: Arc<dyn WorkHandler<T>>,
        num_workers: usize,
    ) -> Self {
        let workers = (0..num_workers)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    loop {
                        let item = queue.pop().await;
                        debug!(worker = worker_id, priority = item.priority, "processing item");
                        if let Err(err) = handler.handle(item.payload).await {
                            error!(
                                worker = worker_id,
                                error = %err,
                                "aborted processing of queue item"
                            );
                        }
                        queue.task_done();
                    }
                })
            })
            .collect();

        Self { queue, workers }
    }

    /// Wait until every enqueued item has been processed and acknowledged,
    /// then cancel the workers and await their cancellation.
    pub async fn finish(self) {
        self.queue.join().await;

        for worker in &self.workers {
            worker.abort();
        }
        for worker in self.workers {
            match worker.await {
                Ok(()) => {}
                // cancellation raised during teardown is expected, not an error
                Err(err) if err.is_cancelled() => {}
                Err(err) => error!(error = %err, "worker terminated abnormally"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        seen: Mutex<Vec<u64>>,
        processed: AtomicUsize,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                processed: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WorkHandler<u64> for Recorder {
        async fn handle(&self, payload: u64) -> RelayResult<()> {
            self.seen.lock().push(payload);
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn every_item_processed_exactly_once() {
        let queue = Arc::new(WorkQueue::new());
        let handler = Arc::new(Recorder::new());

        // enqueue before any worker starts so ordering is decided up front
        for priority in (0..20u64).rev() {
            queue.push(priority, priority);
        }

        let pool = WorkerPool::start(queue.clone(), handler.clone(), 4);
        pool.finish().await;

        assert_eq!(handler.processed.load(Ordering::SeqCst), 20);
        assert!(queue.is_empty());
        let mut seen = handler.seen.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn single_worker_respects_priority_order() {
        let queue = Arc::new(WorkQueue::new());
        let handler = Arc::new(Recorder::new());

        for priority in [9u64, 3, 7, 1] {
            queue.push(priority, priority);
        }

        let pool = WorkerPool::start(queue.clone(), handler.clone(), 1);
        pool.finish().await;

        assert_eq!(*handler.seen.lock(), vec![1, 3, 7, 9]);
    }

    struct FailsOdd {
        processed: AtomicUsize,
    }

    #[async_trait]
    impl WorkHandler<u64> for FailsOdd {
        async fn handle(&self, payload: u64) -> RelayResult<()> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            if payload % 2 == 1 {
                return Err(RelayError::Degree(format!("bad item {payload}")));
            }
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn handler_errors_do_not_kill_the_pool() {
        let queue = Arc::new(WorkQueue::new());
        let handler = Arc::new(FailsOdd {
            processed: AtomicUsize::new(0),
        });

        for n in 0..10u64 {
            queue.push(n, 0);
        }

        let pool = WorkerPool::start(queue.clone(), handler.clone(), 2);
        pool.finish().await;

        assert_eq!(handler.processed.load(Ordering::SeqCst), 10);
        assert!(queue.is_empty());
    }
}
