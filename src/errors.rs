//! Error types for hybrid-rag
//!
//! Backend failures are absorbed at the store and index boundaries, so the
//! variants here are the ones a caller of the retrieval API can actually see.

use thiserror::Error;

use crate::rag::reranking::RerankError;

/// Main error type for retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Caller contract violations, rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reranker failure, only surfaced when degradation is disabled
    #[error("Reranker failed: {0}")]
    Reranker(#[from] RerankError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

impl RetrievalError {
    /// Shorthand used by argument validation
    pub fn invalid(msg: impl Into<String>) -> Self {
        RetrievalError::InvalidArgument(msg.into())
    }

    /// True for errors caused by the caller rather than a backend
    pub fn is_caller_error(&self) -> bool {
        matches!(self, RetrievalError::InvalidArgument(_))
    }
}
