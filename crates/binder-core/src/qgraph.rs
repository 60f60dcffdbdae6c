//! Query graph: the pattern to match
//!
//! Node and edge maps are `BTreeMap`s so that iteration order (and therefore
//! anchor/edge selection in the matching engines) is deterministic by key
//! rather than by insertion history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Universal category: a node constrained to this matches any category.
pub const DEFAULT_CATEGORY: &str = "biolink:NamedThing";

/// Universal predicate: an edge constrained to this matches any predicate.
pub const DEFAULT_PREDICATE: &str = "biolink:related_to";

/// A query node: optionally pinned to concrete identifiers, optionally
/// filtered by category.
///
/// Unknown attributes are kept in `extra` rather than rejected at parse time.
/// The store adapter treats them as match constraints against its schema and
/// reports zero matches for attributes the schema does not have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl QueryNode {
    /// Whether this node carries at least one concrete identifier.
    pub fn is_pinned(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Pin this node to a single concrete identifier, replacing any prior ids.
    pub fn pin(&mut self, id: impl Into<String>) {
        self.ids = vec![id.into()];
    }
}

/// A query edge between two query nodes, optionally filtered by predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEdge {
    pub subject: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<String>,
}

/// A query graph: node-id -> node, edge-id -> edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, QueryNode>,
    #[serde(default)]
    pub edges: BTreeMap<String, QueryEdge>,
}

impl QueryGraph {
    /// Check that every edge endpoint references an existing node.
    pub fn validate(&self) -> CoreResult<()> {
        for (edge_id, edge) in &self.edges {
            for node_id in [&edge.subject, &edge.object] {
                if !self.nodes.contains_key(node_id) {
                    return Err(CoreError::DanglingEdge {
                        edge_id: edge_id.clone(),
                        node_id: node_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fill in universal defaults: nodes without categories match any
    /// category, edges without predicates match any predicate. The legacy
    /// `is_set` attribute carries no meaning here and is dropped.
    pub fn normalize(&mut self) {
        for node in self.nodes.values_mut() {
            if node.categories.is_empty() {
                node.categories = vec![DEFAULT_CATEGORY.to_string()];
            }
            node.extra.remove("is_set");
        }
        for edge in self.edges.values_mut() {
            if edge.predicates.is_empty() {
                edge.predicates = vec![DEFAULT_PREDICATE.to_string()];
            }
        }
    }

    /// Edges incident to a node, split into (outgoing, incoming) by whether
    /// the node is the edge's subject or object. A self-edge appears in both
    /// lists. Each list is in ascending edge-id order.
    pub fn connected_edges(&self, node_id: &str) -> (Vec<String>, Vec<String>) {
        let mut outgoing = Vec::new();
        let mut incoming = Vec::new();
        for (edge_id, edge) in &self.edges {
            if edge.subject == node_id {
                outgoing.push(edge_id.clone());
            }
            if edge.object == node_id {
                incoming.push(edge_id.clone());
            }
        }
        (outgoing, incoming)
    }

    /// Drop every node with zero incident edges.
    pub fn remove_orphaned(&mut self) {
        let edges = &self.edges;
        self.nodes.retain(|node_id, _| {
            edges
                .values()
                .any(|edge| edge.subject == *node_id || edge.object == *node_id)
        });
    }

    /// The first node (in key order) carrying at least one pinned identifier.
    pub fn first_pinned_node(&self) -> Option<(&String, &QueryNode)> {
        self.nodes.iter().find(|(_, node)| node.is_pinned())
    }

    /// Edge ids where at least one endpoint is pinned: the frontier eligible
    /// for one-hop delegation.
    pub fn traversable_edges(&self) -> impl Iterator<Item = &String> {
        self.edges.iter().filter_map(|(edge_id, edge)| {
            let pinned = |node_id: &str| {
                self.nodes
                    .get(node_id)
                    .map(QueryNode::is_pinned)
                    .unwrap_or(false)
            };
            (pinned(&edge.subject) || pinned(&edge.object)).then_some(edge_id)
        })
    }

    /// The minimal subgraph containing just one edge and its two endpoints,
    /// for delegation to a one-hop lookup.
    pub fn onehop_from(&self, edge_id: &str) -> CoreResult<QueryGraph> {
        let edge = self
            .edges
            .get(edge_id)
            .ok_or_else(|| CoreError::NoSuchEdge(edge_id.to_string()))?;
        let nodes = self
            .nodes
            .iter()
            .filter(|(node_id, _)| **node_id == edge.subject || **node_id == edge.object)
            .map(|(node_id, node)| (node_id.clone(), node.clone()))
            .collect();
        Ok(QueryGraph {
            nodes,
            edges: BTreeMap::from([(edge_id.to_string(), edge.clone())]),
        })
    }
}
