// Reranking: query-conditioned rescoring of merged candidates
//
// The reranker is the point where graph and keyword scores, which live on
// unrelated scales, become comparable.
//
// Components:
// - Reranker: the seam the orchestrator depends on
// - LexicalReranker: deterministic in-process scorer
// - HttpReranker: cross-encoder served over HTTP (TEI wire format)
// - RetryPolicy: bounded backoff for the HTTP client

pub mod http;
pub mod lexical;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

pub use http::{HttpReranker, HttpRerankerConfig};
pub use lexical::{LexicalRerankConfig, LexicalReranker};
pub use retry::RetryPolicy;

/// Reranker failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RerankError {
    #[error("reranker unavailable: {0}")]
    Unavailable(String),

    #[error("reranker transport error: {0}")]
    Transport(String),

    #[error("reranker returned HTTP {status}")]
    Status { status: u16 },

    #[error("reranker returned {got} scores for {expected} candidates")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid reranker response: {0}")]
    InvalidResponse(String),
}

impl RerankError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            RerankError::Transport(_) => true,
            RerankError::Status { status } => *status >= 500,
            RerankError::Unavailable(_) => false,
            RerankError::LengthMismatch { .. } => false,
            RerankError::InvalidResponse(_) => false,
        }
    }
}

/// Query-conditioned relevance model.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// One score per candidate, in input order, on a scale shared by all
    /// candidates regardless of where they came from.
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, RerankError>;
}
