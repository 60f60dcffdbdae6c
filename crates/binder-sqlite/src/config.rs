//! SQLite configuration

use std::path::PathBuf;

/// Configuration for a SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:` for an in-memory database
    pub path: PathBuf,
    /// Enable write-ahead logging (better read concurrency)
    pub wal_mode: bool,
    /// Enforce foreign keys (edges reference nodes)
    pub foreign_keys: bool,
    /// How long to wait on a locked database before failing
    pub busy_timeout_ms: u32,
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }

    /// In-memory database, mainly for tests.
    pub fn memory() -> Self {
        Self {
            // WAL is meaningless without a file
            wal_mode: false,
            ..Self::new(":memory:")
        }
    }
}
