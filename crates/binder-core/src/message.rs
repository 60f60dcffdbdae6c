//! Answer bindings and the partially-resolved message envelope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kgraph::KnowledgeGraph;
use crate::qgraph::QueryGraph;

/// One concrete id bound to a query node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: String,
}

impl Binding {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One answer to a query graph: concrete ids for each query node and edge.
///
/// A fully resolved answer binds every node and edge of the original query
/// graph. The empty answer is the identity element of result assembly: it is
/// what matching a zero-edge query graph returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub node_bindings: BTreeMap<String, Vec<Binding>>,
    #[serde(default)]
    pub edge_bindings: BTreeMap<String, Vec<Binding>>,
}

impl Answer {
    /// Bind a query node id to a concrete node id, replacing prior bindings
    /// for that query node.
    pub fn bind_node(&mut self, qnode_id: impl Into<String>, knode_id: impl Into<String>) {
        self.node_bindings
            .insert(qnode_id.into(), vec![Binding::new(knode_id)]);
    }

    /// Bind a query edge id to a concrete edge id.
    pub fn bind_edge(&mut self, qedge_id: impl Into<String>, kedge_id: impl Into<String>) {
        self.edge_bindings
            .insert(qedge_id.into(), vec![Binding::new(kedge_id)]);
    }

    /// Overlay another answer's bindings onto this one. Bindings in `other`
    /// win on conflicting keys.
    pub fn extend(&mut self, other: &Answer) {
        for (qnode_id, bindings) in &other.node_bindings {
            self.node_bindings
                .insert(qnode_id.clone(), bindings.clone());
        }
        for (qedge_id, bindings) in &other.edge_bindings {
            self.edge_bindings
                .insert(qedge_id.clone(), bindings.clone());
        }
    }
}

/// A partially-resolved decomposition step: the remaining query graph plus
/// everything accumulated so far. This is the payload carried by work items
/// and persisted once the query graph reaches zero edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub query_graph: QueryGraph,
    #[serde(default, skip_serializing_if = "KnowledgeGraph::is_empty")]
    pub knowledge_graph: KnowledgeGraph,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Answer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_overlays_bindings() {
        let mut base = Answer::default();
        base.bind_node("n0", "MONDO:0005148");
        base.bind_edge("e01", "edge-1");

        let mut overlay = Answer::default();
        overlay.bind_node("n0", "MONDO:0005737");
        overlay.bind_node("n1", "CHEBI:6801");

        base.extend(&overlay);
        assert_eq!(base.node_bindings["n0"], vec![Binding::new("MONDO:0005737")]);
        assert_eq!(base.node_bindings["n1"], vec![Binding::new("CHEBI:6801")]);
        assert_eq!(base.edge_bindings["e01"], vec![Binding::new("edge-1")]);
    }

    #[test]
    fn result_wire_shape() {
        let mut answer = Answer::default();
        answer.bind_node("n0", "MONDO:0005148");
        answer.bind_edge("e01", "edge-1");
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "node_bindings": {"n0": [{"id": "MONDO:0005148"}]},
                "edge_bindings": {"e01": [{"id": "edge-1"}]}
            })
        );
    }

    #[test]
    fn message_defaults_when_fields_absent() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "query_graph": {"nodes": {}, "edges": {}}
        }))
        .unwrap();
        assert!(message.knowledge_graph.is_empty());
        assert!(message.results.is_empty());
    }
}
