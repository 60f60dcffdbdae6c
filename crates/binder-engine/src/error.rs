//! Engine error types

use thiserror::Error;

/// Pattern matching engine error
#[derive(Error, Debug)]
pub enum EngineError {
    /// The query graph has edges but no pinned node to anchor the search.
    /// The caller must guarantee at least one anchor.
    #[error("no pinned node with incident edges to anchor the search (nodes: {nodes})")]
    Planning { nodes: String },

    /// Malformed query graph
    #[error(transparent)]
    InvalidGraph(#[from] binder_core::CoreError),

    /// Backing store failure
    #[error(transparent)]
    Store(#[from] binder_sqlite::SqliteError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
