//! Error types for the SQLite backing store

use thiserror::Error;

/// SQLite backing store error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("schema error: {0}")]
    Schema(String),

    /// A match condition references a column the schema does not have.
    ///
    /// Callers of [`crate::store::KnowledgeStore::get_kedges`] never see this:
    /// the store downgrades it to an empty result map.
    #[error("unrecognized column: '{0}'")]
    UnrecognizedColumn(String),

    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying rusqlite error
    #[error("sqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type SqliteResult<T> = Result<T, SqliteError>;
