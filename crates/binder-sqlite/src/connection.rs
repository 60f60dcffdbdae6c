//! SQLite connection management
//!
//! A single connection behind a mutex. Access goes through closures so the
//! lock (and therefore the connection) is acquired on entry and released on
//! every exit path, including errors.

use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;

/// Thread-safe SQLite connection wrapper
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqlitePool {
    /// Open (or create) the database at the configured path and apply the
    /// schema.
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, "opening SQLite database");

        let conn = if config.path.to_str() == Some(":memory:") {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SqliteError::Connection(format!("failed to create directory: {}", e))
                })?;
            }
            Connection::open(&config.path)?
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };
        pool.initialize()?;
        Ok(pool)
    }

    /// In-memory pool for testing.
    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    /// Execute a closure with exclusive access to the connection.
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access to the connection (needed for
    /// transactions).
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    fn initialize(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;
            schema::apply_migrations(conn)?;
            Ok(())
        })
    }

    fn configure_pragmas(&self, conn: &Connection) -> SqliteResult<()> {
        debug!("configuring SQLite pragmas");

        if self.config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }

        if self.config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_pool_answers_queries() {
        let pool = SqlitePool::memory().expect("failed to create memory pool");

        pool.with_connection(|conn| {
            let result: i64 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0))?;
            assert_eq!(result, 2);
            Ok(())
        })
        .expect("query failed");
    }

    #[test]
    fn file_pool_uses_wal_mode() {
        let dir = TempDir::new().unwrap();
        let config = SqliteConfig::new(dir.path().join("kg.db"));
        let pool = SqlitePool::new(config).expect("failed to create pool");

        pool.with_connection(|conn| {
            let mode: String = conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
            assert_eq!(mode.to_lowercase(), "wal");
            Ok(())
        })
        .expect("query failed");
    }

    #[test]
    fn schema_applied_on_open() {
        let pool = SqlitePool::memory().expect("failed to create pool");

        pool.with_connection(|conn| {
            let tables: Vec<String> = {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.filter_map(Result::ok).collect()
            };

            assert!(tables.contains(&"nodes".to_string()));
            assert!(tables.contains(&"edges".to_string()));
            Ok(())
        })
        .expect("failed to verify schema");
    }
}
