//! Queue-driven decomposition of query graphs against a remote one-hop service
//!
//! The same one-edge-per-step reduction as the local matching engine, but
//! iterative instead of recursive: each step is a work item on a priority
//! queue, one-hop sub-patterns are delegated to a remote lookup service, and
//! reduced messages are re-enqueued with a priority equal to the fan-out
//! ("degree") of the newly pinned node. Expanding low-degree nodes first is a
//! greedy heuristic that tends to shrink the remaining search space fastest.

pub mod decompose;
pub mod degree;
pub mod error;
pub mod onehop;
pub mod pool;
pub mod queue;
pub mod relay;

pub use decompose::Decomposer;
pub use degree::{CypherDegreeLookup, DegreeCache, DegreeLookup};
pub use error::{RelayError, RelayResult};
pub use onehop::{OnehopService, TrapiClient, TrapiClientConfig};
pub use pool::{WorkHandler, WorkerPool};
pub use queue::{WorkItem, WorkQueue};
pub use relay::{Relay, RelayConfig};
