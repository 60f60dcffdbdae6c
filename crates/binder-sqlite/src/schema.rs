//! Schema management and migrations

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{SqliteError, SqliteResult};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "applying schema migrations");
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: nodes and edges
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("failed to apply v1 schema: {}", e)))?;
    record_migration(conn, 1)?;
    Ok(())
}

/// Initial schema SQL
///
/// `nodes.category` holds the delimited multi-value encoding, e.g.
/// `|biolink:Disease||biolink:NamedThing|`. Self-referential edges
/// (subject == object) are valid.
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY NOT NULL,
    category TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS edges (
    id TEXT PRIMARY KEY NOT NULL,
    subject TEXT NOT NULL REFERENCES nodes(id),
    predicate TEXT NOT NULL,
    object TEXT NOT NULL REFERENCES nodes(id)
);

CREATE INDEX IF NOT EXISTS idx_edges_subject ON edges(subject);
CREATE INDEX IF NOT EXISTS idx_edges_object ON edges(object);
CREATE INDEX IF NOT EXISTS idx_edges_predicate ON edges(predicate);
"#;
