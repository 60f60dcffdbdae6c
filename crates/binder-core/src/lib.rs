//! Core value types for the binder query-graph decomposition engine
//!
//! A *query graph* is a pattern: nodes carry optional pinned identifiers and
//! category filters, edges carry optional predicate filters. Matching a query
//! graph against a store produces a *knowledge graph* (the concrete nodes and
//! edges that participated in any match) plus a list of *answers* binding each
//! query node/edge id to concrete ids.
//!
//! These types are deliberately plain values. Every branch point in the
//! matching algorithms clones its input graph, so nothing here hands out
//! shared mutable state.

pub mod error;
pub mod kgraph;
pub mod message;
pub mod qgraph;

pub use error::{CoreError, CoreResult};
pub use kgraph::{KnowledgeEdge, KnowledgeGraph, KnowledgeNode};
pub use message::{Answer, Binding, Message};
pub use qgraph::{QueryEdge, QueryGraph, QueryNode, DEFAULT_CATEGORY, DEFAULT_PREDICATE};
