//! Error types for the relay

use thiserror::Error;

/// Relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// The query graph has edges but none with a pinned endpoint to
    /// delegate. The caller must guarantee at least one anchor.
    #[error("no traversable edge (pinned endpoint) in query graph (edges: {edges})")]
    Planning { edges: String },

    /// A single one-hop result tried to assign two priorities to one step.
    /// This cannot happen for a well-formed one-hop response.
    #[error("one-hop result assigned conflicting priorities for a single step")]
    InvariantViolation,

    /// Remote one-hop lookup failed after exhausting retries
    #[error("remote one-hop lookup failed after {attempts} attempts: {message}")]
    Remote { attempts: u32, message: String },

    /// Degree lookup failure
    #[error("degree lookup failed: {0}")]
    Degree(String),

    /// Malformed query graph
    #[error(transparent)]
    Graph(#[from] binder_core::CoreError),

    /// Result serialization failure
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Output file failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
