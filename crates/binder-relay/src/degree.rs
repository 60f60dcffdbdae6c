//! Node degree lookup and its bounded memoization
//!
//! Degree (incident-edge count of a concrete node) is only an expansion
//! ordering heuristic, but it costs a network round trip, so lookups go
//! through an explicitly owned, bounded cache rather than an implicit
//! process-wide one.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RelayError, RelayResult};

/// Looks up the fan-out of a concrete node.
#[async_trait]
pub trait DegreeLookup: Send + Sync {
    async fn degree(&self, curie: &str) -> RelayResult<u64>;
}

/// Degree lookup against a Cypher endpoint (e.g. an automat instance).
pub struct CypherDegreeLookup {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl CypherDegreeLookup {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl DegreeLookup for CypherDegreeLookup {
    async fn degree(&self, curie: &str) -> RelayResult<u64> {
        let query = format!("MATCH (n {{id: \"{}\"}}) RETURN size((n)--())", curie);
        debug!(curie = %curie, "looking up degree");

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "query": query }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::Degree(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Degree(format!(
                "degree service returned status {}",
                status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RelayError::Degree(e.to_string()))?;
        body["results"][0]["data"][0]["row"][0]
            .as_u64()
            .ok_or_else(|| RelayError::Degree(format!("malformed degree response for {}", curie)))
    }
}

/// Bounded memoization of degree lookups, FIFO eviction.
pub struct DegreeCache {
    lookup: Arc<dyn DegreeLookup>,
    max_entries: usize,
    inner: tokio::sync::Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, u64>,
    order: VecDeque<String>,
}

impl DegreeCache {
    pub fn new(lookup: Arc<dyn DegreeLookup>, max_entries: usize) -> Self {
        Self {
            lookup,
            max_entries: max_entries.max(1),
            inner: tokio::sync::Mutex::new(CacheInner::default()),
        }
    }

    /// Cached degree of a node.
    ///
    /// The remote call happens outside the cache lock, so a slow lookup
    /// never stalls lookups of unrelated ids. Concurrent workers racing on
    /// the same uncached id may fetch it more than once; the degree of a
    /// node does not change mid-run, so every fetch stores the same value.
    pub async fn get(&self, curie: &str) -> RelayResult<u64> {
        if let Some(degree) = self.inner.lock().await.entries.get(curie) {
            return Ok(*degree);
        }

        let degree = self.lookup.degree(curie).await?;

        let mut inner = self.inner.lock().await;
        if !inner.entries.contains_key(curie) {
            if inner.entries.len() >= self.max_entries {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            inner.order.push_back(curie.to_string());
        }
        inner.entries.insert(curie.to_string(), degree);
        Ok(degree)
    }
}
