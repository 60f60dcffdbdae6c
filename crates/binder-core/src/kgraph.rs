//! Knowledge graph: the concrete nodes and edges matched so far
//!
//! Assembly is upsert-only. The same concrete id always maps to the same
//! data, so last-write-wins merging is safe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A concrete matched node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// A concrete matched edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Accumulated matched nodes and edges, keyed by concrete id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, KnowledgeNode>,
    #[serde(default)]
    pub edges: BTreeMap<String, KnowledgeEdge>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Union another knowledge graph into this one.
    pub fn merge(&mut self, other: KnowledgeGraph) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }

    pub fn insert_node(&mut self, id: impl Into<String>, node: KnowledgeNode) {
        self.nodes.insert(id.into(), node);
    }

    pub fn insert_edge(&mut self, id: impl Into<String>, edge: KnowledgeEdge) {
        self.edges.insert(id.into(), edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_union() {
        let mut left = KnowledgeGraph::default();
        left.insert_node(
            "CHEBI:6801",
            KnowledgeNode {
                categories: vec!["biolink:ChemicalSubstance".to_string()],
            },
        );

        let mut right = KnowledgeGraph::default();
        right.insert_node(
            "MONDO:0005148",
            KnowledgeNode {
                categories: vec!["biolink:Disease".to_string()],
            },
        );
        right.insert_edge(
            "e-1",
            KnowledgeEdge {
                subject: "CHEBI:6801".to_string(),
                predicate: "biolink:treats".to_string(),
                object: "MONDO:0005148".to_string(),
            },
        );

        left.merge(right);
        assert_eq!(left.nodes.len(), 2);
        assert_eq!(left.edges.len(), 1);
    }
}
