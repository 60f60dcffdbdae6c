//! One-hop decomposition and result assembly

use std::collections::BTreeMap;

use tracing::{debug, trace};

use binder_core::{Answer, KnowledgeGraph, QueryEdge, QueryGraph};
use binder_sqlite::{EdgeFilter, KnowledgeStore};

use crate::error::{EngineError, EngineResult};

/// Matches query graphs against a [`KnowledgeStore`].
///
/// Matching is sequential: each branch fully resolves, including all of its
/// recursive subcalls, before the next sibling begins, so answer order is
/// deterministic. Worst-case answer count is exponential in the number of
/// query edges (the product of matching concrete edges at every step); no
/// memoization is performed.
pub struct KnowledgeProvider {
    store: KnowledgeStore,
}

impl KnowledgeProvider {
    pub fn new(store: KnowledgeStore) -> Self {
        Self { store }
    }

    /// Match a query graph, returning the accumulated knowledge graph and
    /// all answers.
    ///
    /// The input graph is validated and normalized on a private copy; the
    /// caller's graph is never mutated.
    pub fn get_results(
        &self,
        qgraph: &QueryGraph,
    ) -> EngineResult<(KnowledgeGraph, Vec<Answer>)> {
        qgraph.validate()?;
        let mut qgraph = qgraph.clone();
        qgraph.normalize();
        self.lookup(&qgraph)
    }

    /// Expand one edge from a pinned anchor node and recurse on the rest.
    ///
    /// Every recursive call removes exactly one edge, so depth is bounded by
    /// the edge count even when the query graph contains a cycle; the cycle
    /// is broken the first time one of its edges is consumed.
    fn lookup(&self, qgraph: &QueryGraph) -> EngineResult<(KnowledgeGraph, Vec<Answer>)> {
        if qgraph.edges.is_empty() {
            return Ok((KnowledgeGraph::default(), vec![Answer::default()]));
        }

        let (anchor_id, qedge_id) = self.pick_anchor(qgraph)?;
        let qedge = qgraph.edges[&qedge_id].clone();
        let anchor_ids = qgraph.nodes[&anchor_id].ids.clone();
        debug!(anchor = %anchor_id, edge = %qedge_id, "expanding");

        let mut kgraph = KnowledgeGraph::default();
        let mut answers = Vec::new();

        // an anchor may carry several pinned ids; answers are the union
        for curie in &anchor_ids {
            trace!(anchor = %anchor_id, curie = %curie, "expanding from identifier");
            let filter = edge_filter(qgraph, &qedge, &anchor_id, curie);
            let kedges = self.store.get_kedges(&filter)?;

            for (kedge_id, kedge) in kedges {
                trace!(qedge = %qedge_id, kedge = %kedge_id, "expanding along edge");

                let mut reduced = qgraph.clone();
                reduced.edges.remove(&qedge_id);
                if let Some(node) = reduced.nodes.get_mut(&qedge.subject) {
                    node.pin(&kedge.subject);
                }
                if let Some(node) = reduced.nodes.get_mut(&qedge.object) {
                    node.pin(&kedge.object);
                }
                reduced.remove_orphaned();

                let (sub_kgraph, sub_answers) = self.lookup(&reduced)?;

                kgraph.insert_node(kedge.subject.clone(), self.store.get_knode(&kedge.subject)?);
                kgraph.insert_node(kedge.object.clone(), self.store.get_knode(&kedge.object)?);
                kgraph.insert_edge(kedge_id.clone(), kedge.clone());
                kgraph.merge(sub_kgraph);

                for mut answer in sub_answers {
                    answer.bind_node(qedge.subject.clone(), kedge.subject.clone());
                    answer.bind_node(qedge.object.clone(), kedge.object.clone());
                    answer.bind_edge(qedge_id.clone(), kedge_id.clone());
                    answers.push(answer);
                }
            }
        }

        Ok((kgraph, answers))
    }

    /// Select the anchor node and the query edge to expand: the first pinned
    /// node (in key order) with at least one incident edge, and its first
    /// incident edge in adjacency order (outgoing before incoming, each in
    /// ascending edge-id order).
    fn pick_anchor(&self, qgraph: &QueryGraph) -> EngineResult<(String, String)> {
        for (node_id, node) in &qgraph.nodes {
            if !node.is_pinned() {
                continue;
            }
            let (outgoing, incoming) = qgraph.connected_edges(node_id);
            if let Some(qedge_id) = outgoing.into_iter().chain(incoming).next() {
                return Ok((node_id.clone(), qedge_id));
            }
        }
        Err(EngineError::Planning {
            nodes: qgraph.nodes.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }
}

/// Build the store filter for one query edge, with the anchor endpoint
/// resolved to a single identifier.
fn edge_filter(
    qgraph: &QueryGraph,
    qedge: &QueryEdge,
    anchor_id: &str,
    curie: &str,
) -> EdgeFilter {
    let subject = &qgraph.nodes[&qedge.subject];
    let object = &qgraph.nodes[&qedge.object];

    let role_ids = |node_id: &str, ids: &[String]| {
        if node_id == anchor_id {
            vec![curie.to_string()]
        } else {
            ids.to_vec()
        }
    };

    let mut extra = BTreeMap::new();
    for (key, value) in &subject.extra {
        extra.insert(format!("subject.{}", key), value.clone());
    }
    for (key, value) in &object.extra {
        extra.insert(format!("object.{}", key), value.clone());
    }

    EdgeFilter {
        predicates: qedge.predicates.clone(),
        subject_ids: role_ids(&qedge.subject, &subject.ids),
        subject_categories: subject.categories.clone(),
        object_ids: role_ids(&qedge.object, &object.ids),
        object_categories: object.categories.clone(),
        extra,
    }
}
