//! Cross-encoder reranker served over HTTP
//!
//! Speaks the text-embeddings-inference rerank format:
//! `POST {endpoint}` with `{"query": .., "texts": [..]}` answers
//! `[{"index": i, "score": s}, ..]` in relevance order. Scores are put back
//! into input order before being returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RetrievalError, Result};
use crate::rag::reranking::{RerankError, Reranker, RetryPolicy};

/// Connection settings for [`HttpReranker`]
#[derive(Debug, Clone)]
pub struct HttpRerankerConfig {
    /// Full URL of the rerank route, e.g. `http://127.0.0.1:8080/rerank`
    pub endpoint: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl HttpRerankerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            max_retries: super::retry::DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RankedText {
    index: usize,
    score: f32,
}

/// HTTP client for a remote cross-encoder
pub struct HttpReranker {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpReranker {
    pub fn new(config: HttpRerankerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, query: &str, candidates: &[String]) -> std::result::Result<Vec<f32>, RerankError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RerankRequest {
                query,
                texts: candidates,
            })
            .send()
            .await
            .map_err(|e| RerankError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RerankError::Status {
                status: status.as_u16(),
            });
        }

        let ranked: Vec<RankedText> = response
            .json()
            .await
            .map_err(|e| RerankError::InvalidResponse(e.to_string()))?;

        scores_in_input_order(ranked, candidates.len())
    }
}

fn scores_in_input_order(
    ranked: Vec<RankedText>,
    expected: usize,
) -> std::result::Result<Vec<f32>, RerankError> {
    if ranked.len() != expected {
        return Err(RerankError::LengthMismatch {
            expected,
            got: ranked.len(),
        });
    }

    let mut scores: Vec<Option<f32>> = vec![None; expected];
    for item in ranked {
        let slot = scores.get_mut(item.index).ok_or_else(|| {
            RerankError::InvalidResponse(format!("index {} out of range", item.index))
        })?;
        if slot.replace(item.score).is_some() {
            return Err(RerankError::InvalidResponse(format!(
                "index {} scored twice",
                item.index
            )));
        }
    }

    // Every slot is filled: lengths match and no index repeats
    Ok(scores.into_iter().flatten().collect())
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, candidates: &[String]) -> std::result::Result<Vec<f32>, RerankError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        self.retry.run(|| self.call(query, candidates)).await
    }
}
