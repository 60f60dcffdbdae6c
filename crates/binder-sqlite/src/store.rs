//! Knowledge store adapter: typed queries over the nodes/edges schema

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::OptionalExtension;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use binder_core::{KnowledgeEdge, KnowledgeNode, DEFAULT_CATEGORY, DEFAULT_PREDICATE};

use crate::conditions::Condition;
use crate::config::SqliteConfig;
use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};

/// Columns addressable from an edge match condition. The edge is joined to
/// both endpoint nodes so category constraints apply in the same query.
const KEDGE_COLUMNS: &[&str] = &[
    "edge.id",
    "edge.predicate",
    "subject.id",
    "subject.category",
    "object.id",
    "object.category",
];

/// A node to ingest.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: String,
    pub categories: Vec<String>,
}

/// An edge to ingest. A missing id gets a generated UUID.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: Option<String>,
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// One (subject-category, predicate, object-category) capability triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Operation {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Match constraints for one edge lookup.
///
/// The universal category/predicate match anything, so constraint lists
/// containing them are dropped entirely rather than compared against stored
/// values. `extra` carries unvalidated attribute constraints (qualified
/// column -> value); unknown columns there make the whole lookup match
/// nothing, by way of the condition whitelist.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub predicates: Vec<String>,
    pub subject_ids: Vec<String>,
    pub subject_categories: Vec<String>,
    pub object_ids: Vec<String>,
    pub object_categories: Vec<String>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EdgeFilter {
    fn to_condition(&self) -> Condition {
        let mut clauses = Vec::new();

        if !self.predicates.iter().any(|p| p == DEFAULT_PREDICATE) && !self.predicates.is_empty() {
            clauses.push(Condition::In(
                "edge.predicate".to_string(),
                self.predicates.iter().map(|p| p.as_str().into()).collect(),
            ));
        }
        for (column, ids) in [
            ("subject.id", &self.subject_ids),
            ("object.id", &self.object_ids),
        ] {
            if !ids.is_empty() {
                clauses.push(Condition::In(
                    column.to_string(),
                    ids.iter().map(|id| id.as_str().into()).collect(),
                ));
            }
        }
        for (column, categories) in [
            ("subject.category", &self.subject_categories),
            ("object.category", &self.object_categories),
        ] {
            if let Some(condition) = category_condition(column, categories) {
                clauses.push(condition);
            }
        }
        if !self.extra.is_empty() {
            clauses.push(Condition::from_map(&self.extra));
        }

        Condition::And(clauses)
    }
}

/// Membership test against the delimited category encoding.
fn category_condition(column: &str, categories: &[String]) -> Option<Condition> {
    if categories.is_empty() || categories.iter().any(|c| c == DEFAULT_CATEGORY) {
        return None;
    }
    Some(Condition::Or(
        categories
            .iter()
            .map(|category| Condition::Like(column.to_string(), format!("%|{}|%", category)))
            .collect(),
    ))
}

/// Encode a category list for storage, e.g. `|catA||catB|`.
fn encode_categories(categories: &[String]) -> String {
    categories
        .iter()
        .map(|c| format!("|{}|", c))
        .collect::<String>()
}

/// Decode a stored category value back into a list.
fn decode_categories(stored: &str) -> Vec<String> {
    let trimmed = stored
        .strip_prefix('|')
        .and_then(|s| s.strip_suffix('|'))
        .unwrap_or(stored);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split("||").map(String::from).collect()
}

/// The backing store adapter the matching engine queries.
#[derive(Clone)]
pub struct KnowledgeStore {
    pool: SqlitePool,
}

impl KnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::new(config)?))
    }

    /// In-memory store for testing.
    pub fn memory() -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::memory()?))
    }

    /// Find concrete edges matching the filter, joined to both endpoint
    /// nodes, in ascending edge-id order.
    ///
    /// A filter referencing an attribute the schema does not have matches
    /// nothing; that is a caller mistake we answer with an empty map, not an
    /// error.
    pub fn get_kedges(&self, filter: &EdgeFilter) -> SqliteResult<BTreeMap<String, KnowledgeEdge>> {
        let (where_sql, params) = match filter.to_condition().to_sql(KEDGE_COLUMNS) {
            Ok(rendered) => rendered,
            Err(SqliteError::UnrecognizedColumn(column)) => {
                warn!(column = %column, "unrecognized match column; no edges match");
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err),
        };
        debug!(sql = %where_sql, "edge lookup");

        self.pool.with_connection(|conn| {
            let sql = format!(
                "SELECT edge.id AS id, subject.id AS subject, \
                        edge.predicate AS predicate, object.id AS object \
                 FROM edges AS edge \
                 JOIN nodes AS subject ON edge.subject = subject.id \
                 JOIN nodes AS object ON edge.object = object.id \
                 WHERE {} ORDER BY edge.id",
                where_sql
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    KnowledgeEdge {
                        subject: row.get("subject")?,
                        predicate: row.get("predicate")?,
                        object: row.get("object")?,
                    },
                ))
            })?;
            rows.collect::<Result<BTreeMap<_, _>, _>>()
                .map_err(SqliteError::from)
        })
    }

    /// Fetch a concrete node by id.
    pub fn get_knode(&self, knode_id: &str) -> SqliteResult<KnowledgeNode> {
        self.pool.with_connection(|conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT category FROM nodes WHERE id = ?",
                    [knode_id],
                    |row| row.get(0),
                )
                .optional()?;
            match stored {
                Some(category) => Ok(KnowledgeNode {
                    categories: decode_categories(&category),
                }),
                None => Err(SqliteError::NotFound(knode_id.to_string())),
            }
        })
    }

    /// Insert or replace nodes; categories are encoded on write.
    pub fn add_nodes(&self, nodes: &[NodeRecord]) -> SqliteResult<()> {
        self.pool.with_connection_mut(|conn| {
            let tx = conn.transaction()?;
            for node in nodes {
                tx.execute(
                    "INSERT OR REPLACE INTO nodes (id, category) VALUES (?, ?)",
                    rusqlite::params![node.id, encode_categories(&node.categories)],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Insert or replace edges, generating ids where missing.
    pub fn add_edges(&self, edges: &[EdgeRecord]) -> SqliteResult<()> {
        self.pool.with_connection_mut(|conn| {
            let tx = conn.transaction()?;
            for edge in edges {
                let id = edge
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                tx.execute(
                    "INSERT OR REPLACE INTO edges (id, subject, predicate, object) \
                     VALUES (?, ?, ?, ?)",
                    rusqlite::params![id, edge.subject, edge.predicate, edge.object],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Distinct (subject-category, predicate, object-category) triples.
    /// Multi-category endpoints contribute their cross product.
    pub fn operations(&self) -> SqliteResult<Vec<Operation>> {
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT subject.category, edge.predicate, object.category \
                 FROM edges AS edge \
                 JOIN nodes AS subject ON edge.subject = subject.id \
                 JOIN nodes AS object ON edge.object = object.id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut ops = BTreeSet::new();
            for row in rows {
                let (subject_stored, predicate, object_stored) = row?;
                for subject in decode_categories(&subject_stored) {
                    for object in decode_categories(&object_stored) {
                        ops.insert(Operation {
                            subject: subject.clone(),
                            predicate: predicate.clone(),
                            object,
                        });
                    }
                }
            }
            Ok(ops.into_iter().collect())
        })
    }

    /// Distinct identifier prefixes per category.
    pub fn curie_prefixes(&self) -> SqliteResult<BTreeMap<String, Vec<String>>> {
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id, category FROM nodes")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut prefixes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
            for row in rows {
                let (id, stored) = row?;
                let prefix = id.split(':').next().unwrap_or(&id).to_string();
                for category in decode_categories(&stored) {
                    prefixes.entry(category).or_default().insert(prefix.clone());
                }
            }
            Ok(prefixes
                .into_iter()
                .map(|(category, set)| (category, set.into_iter().collect()))
                .collect())
        })
    }
}
