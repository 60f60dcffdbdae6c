//! SQLite backing store for binder
//!
//! Owns the relational schema (`nodes`, `edges`) and everything that touches
//! it: a thread-safe connection wrapper, schema migrations, the typed match
//! condition tree and its SQL rendering, and the [`KnowledgeStore`] adapter
//! that the matching engine queries.
//!
//! Node categories are stored as a delimited multi-value encoding
//! (`|catA||catB|`). That encoding never escapes this crate: the store
//! decodes it on read, encodes it on write, and matches against it with
//! `LIKE` membership conditions.

pub mod conditions;
pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod store;

pub use conditions::{Condition, Value};
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use store::{EdgeFilter, EdgeRecord, KnowledgeStore, NodeRecord, Operation};
