//! Error types for core graph values

use thiserror::Error;

/// Core value-type error
#[derive(Error, Debug)]
pub enum CoreError {
    /// An edge references a node id that is not present in the graph
    #[error("edge '{edge_id}' references missing node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    /// An edge id was looked up but does not exist
    #[error("no such edge: '{0}'")]
    NoSuchEdge(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
