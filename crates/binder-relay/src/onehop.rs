//! Remote one-hop lookup client
//!
//! Posts a two-node, one-edge query graph to a TRAPI-style `/query` endpoint
//! and decodes the knowledge graph and result bindings from the response.
//! Transient failures are retried with exponential backoff; after the last
//! attempt the error propagates into the per-item handler, where the
//! scheduler's fault isolation catches and logs it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use binder_core::{Answer, KnowledgeGraph, QueryGraph};

use crate::error::{RelayError, RelayResult};

/// Answers one-hop query graphs.
#[async_trait]
pub trait OnehopService: Send + Sync {
    async fn lookup(&self, onehop: &QueryGraph) -> RelayResult<(KnowledgeGraph, Vec<Answer>)>;
}

/// Configuration for [`TrapiClient`].
#[derive(Debug, Clone)]
pub struct TrapiClientConfig {
    /// Full URL of the remote `/query` endpoint
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts before giving up on an item
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt
    pub backoff: Duration,
}

impl TrapiClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// HTTP one-hop lookup against a TRAPI-style service.
pub struct TrapiClient {
    client: reqwest::Client,
    config: TrapiClientConfig,
}

impl TrapiClient {
    pub fn new(config: TrapiClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn try_lookup(
        &self,
        onehop: &QueryGraph,
    ) -> Result<(KnowledgeGraph, Vec<Answer>), String> {
        let request = TrapiRequest {
            message: RequestMessage {
                query_graph: onehop,
            },
        };
        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("remote service returned status {}", status));
        }

        let decoded: TrapiResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to decode response: {}", e))?;
        Ok((decoded.message.knowledge_graph, decoded.message.results))
    }
}

#[async_trait]
impl OnehopService for TrapiClient {
    async fn lookup(&self, onehop: &QueryGraph) -> RelayResult<(KnowledgeGraph, Vec<Answer>)> {
        let mut delay = self.config.backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_lookup(onehop).await {
                Ok(found) => return Ok(found),
                Err(message) if attempt < self.config.max_attempts => {
                    warn!(attempt, error = %message, "one-hop lookup failed; retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(message) => {
                    return Err(RelayError::Remote {
                        attempts: attempt,
                        message,
                    })
                }
            }
        }
    }
}

#[derive(Serialize)]
struct TrapiRequest<'a> {
    message: RequestMessage<'a>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    query_graph: &'a QueryGraph,
}

#[derive(Deserialize)]
struct TrapiResponse {
    #[serde(default)]
    message: ResponseMessage,
}

#[derive(Deserialize, Default)]
struct ResponseMessage {
    #[serde(default)]
    knowledge_graph: KnowledgeGraph,
    #[serde(default)]
    results: Vec<Answer>,
}
