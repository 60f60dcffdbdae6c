//! Recursive query-graph pattern matching against a local SQLite store
//!
//! The engine reduces a query graph by exactly one edge per step: pick a
//! pinned anchor node, look up concrete edges for one incident query edge,
//! and for each match recurse on a copy of the graph with that edge removed
//! and the far endpoint pinned. Recursion bottoms out at the zero-edge graph,
//! whose answer is the single empty binding set.

pub mod engine;
pub mod error;

pub use engine::KnowledgeProvider;
pub use error::{EngineError, EngineResult};
