//! Relay: wiring the decomposer to the queue and worker pool

use std::path::PathBuf;
use std::sync::Arc;

use binder_core::{Answer, Message, QueryGraph};

use crate::decompose::Decomposer;
use crate::degree::{DegreeCache, DegreeLookup};
use crate::error::RelayResult;
use crate::onehop::OnehopService;
use crate::pool::WorkerPool;
use crate::queue::WorkQueue;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Directory terminal results are written to
    pub outdir: PathBuf,
    /// Concurrent worker tasks
    pub num_workers: usize,
    /// Degree cache capacity
    pub degree_cache_size: usize,
}

impl RelayConfig {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            num_workers: 4,
            degree_cache_size: 1024,
        }
    }
}

/// A running decomposition service: a queue, a worker pool, and the
/// decomposer they drive.
pub struct Relay {
    queue: Arc<WorkQueue<Message>>,
    pool: WorkerPool<Message>,
}

impl Relay {
    /// Create the output directory and spawn the worker pool. Must be called
    /// within a tokio runtime.
    pub fn start(
        config: RelayConfig,
        onehop: Arc<dyn OnehopService>,
        degrees: Arc<dyn DegreeLookup>,
    ) -> RelayResult<Self> {
        std::fs::create_dir_all(&config.outdir)?;

        let queue = Arc::new(WorkQueue::new());
        let decomposer = Arc::new(Decomposer::new(
            Arc::clone(&queue),
            onehop,
            DegreeCache::new(degrees, config.degree_cache_size),
            config.outdir,
        ));
        let pool = WorkerPool::start(Arc::clone(&queue), decomposer, config.num_workers);

        Ok(Self { queue, pool })
    }

    /// Submit a query graph for decomposition. The seed message carries the
    /// single empty answer, the identity element of result assembly.
    pub fn submit(&self, qgraph: &QueryGraph) -> RelayResult<()> {
        qgraph.validate()?;
        let mut qgraph = qgraph.clone();
        qgraph.normalize();

        let message = Message {
            query_graph: qgraph,
            knowledge_graph: Default::default(),
            results: vec![Answer::default()],
        };
        self.queue.push(message, 0);
        Ok(())
    }

    /// Drain the queue (including everything re-enqueued along the way),
    /// then cancel the workers.
    pub async fn finish(self) {
        self.pool.finish().await;
    }
}
