//! Retrieval result returned to callers

use serde::{Deserialize, Serialize};

use crate::types::candidate::Candidate;

/// Ordered, bounded evidence set for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Candidates in non-increasing score order
    pub documents: Vec<Candidate>,
    /// Wall time of the whole retrieve call
    pub latency_ms: f64,
    /// Candidates produced by the graph side before dedup
    #[serde(default)]
    pub graph_candidates: usize,
    /// Candidates produced by the keyword side before dedup
    #[serde(default)]
    pub keyword_candidates: usize,
    #[serde(default)]
    pub duplicates_removed: usize,
    /// True when the reranker failed and source-local scores were kept
    #[serde(default)]
    pub reranker_fallback: bool,
}

impl RetrievalResult {
    pub fn empty(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.documents.iter().map(|d| d.score).collect()
    }
}
