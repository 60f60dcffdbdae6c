//! The distributed decomposer: one decomposition step per work item

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use binder_core::Message;

use crate::degree::DegreeCache;
use crate::error::{RelayError, RelayResult};
use crate::onehop::OnehopService;
use crate::pool::WorkHandler;
use crate::queue::WorkQueue;

/// Decomposes partially-resolved messages one edge at a time.
///
/// Each handled item either persists a terminal (zero-edge) result or
/// delegates one traversable edge to the remote one-hop service and
/// re-enqueues every reduced continuation. New items are prioritized by the
/// degree of the newly pinned node so more selective expansions run first.
pub struct Decomposer {
    queue: Arc<WorkQueue<Message>>,
    onehop: Arc<dyn OnehopService>,
    degrees: DegreeCache,
    outdir: PathBuf,
    outcounter: AtomicU64,
}

impl Decomposer {
    pub fn new(
        queue: Arc<WorkQueue<Message>>,
        onehop: Arc<dyn OnehopService>,
        degrees: DegreeCache,
        outdir: PathBuf,
    ) -> Self {
        Self {
            queue,
            onehop,
            degrees,
            outdir,
            outcounter: AtomicU64::new(0),
        }
    }

    /// Write a fully resolved message to the output directory.
    ///
    /// The file name carries a monotonic sequence so concurrent workers
    /// never collide. Serialization happens fully in memory and the write is
    /// a single blocking call, so a task cancelled at an await point can
    /// never leave a truncated file behind.
    fn persist(&self, message: &Message) -> RelayResult<()> {
        let seq = self.outcounter.fetch_add(1, Ordering::Relaxed);
        let path = self.outdir.join(format!("result_{:04}.json", seq));
        info!(file = %path.display(), "saving terminal result");

        let body = serde_json::to_vec_pretty(message)?;
        std::fs::write(&path, body)?;
        Ok(())
    }
}

#[async_trait]
impl WorkHandler<Message> for Decomposer {
    async fn handle(&self, message: Message) -> RelayResult<()> {
        if message.query_graph.edges.is_empty() {
            return self.persist(&message);
        }
        let qgraph = &message.query_graph;

        let qedge_id = qgraph
            .traversable_edges()
            .next()
            .cloned()
            .ok_or_else(|| RelayError::Planning {
                edges: qgraph.edges.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;
        let onehop_qgraph = qgraph.onehop_from(&qedge_id)?;

        debug!(qedge = %qedge_id, "delegating one-hop");
        let (onehop_kgraph, onehop_results) = self.onehop.lookup(&onehop_qgraph).await?;
        debug!(qedge = %qedge_id, results = onehop_results.len(), "one-hop answered");

        for onehop_result in &onehop_results {
            // reduce: drop the consumed edge, prune orphans, pin the far
            // endpoint to the matched id
            let mut reduced = qgraph.clone();
            reduced.edges.remove(&qedge_id);
            reduced.remove_orphaned();

            let mut priority: Option<u64> = None;
            for (qnode_id, bindings) in &onehop_result.node_bindings {
                let Some(node) = reduced.nodes.get_mut(qnode_id) else {
                    continue;
                };
                let Some(binding) = bindings.first() else {
                    continue;
                };
                node.pin(&binding.id);
                if priority.is_some() {
                    return Err(RelayError::InvariantViolation);
                }
                priority = Some(self.degrees.get(&binding.id).await?);
            }

            // merge the bound one-hop fragments into the accumulated state
            let mut kgraph = message.knowledge_graph.clone();
            for bindings in onehop_result.node_bindings.values() {
                for binding in bindings {
                    if let Some(knode) = onehop_kgraph.nodes.get(&binding.id) {
                        kgraph.insert_node(binding.id.clone(), knode.clone());
                    }
                }
            }
            for bindings in onehop_result.edge_bindings.values() {
                for binding in bindings {
                    if let Some(kedge) = onehop_kgraph.edges.get(&binding.id) {
                        kgraph.insert_edge(binding.id.clone(), kedge.clone());
                    }
                }
            }

            let results = message
                .results
                .iter()
                .map(|answer| {
                    let mut answer = answer.clone();
                    answer.extend(onehop_result);
                    answer
                })
                .collect();

            let next = Message {
                query_graph: reduced,
                knowledge_graph: kgraph,
                results,
            };
            if next.query_graph.edges.is_empty() {
                self.persist(&next)?;
            } else {
                self.queue.push(next, priority.unwrap_or(0));
            }
        }

        Ok(())
    }
}
