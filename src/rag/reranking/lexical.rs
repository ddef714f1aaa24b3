// Lexical reranker: query-overlap scoring in [0, 1]
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::keyword::tokenizer::tokenize;
use crate::rag::reranking::{RerankError, Reranker};

/// Lexical rerank weights. They sum to 1.0 so scores stay in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalRerankConfig {
    /// Weight of the fraction of query terms found in the candidate
    pub coverage_weight: f32,
    /// Weight of the fraction of candidate terms that are query terms
    pub density_weight: f32,
    /// Boost when the whole query appears verbatim
    pub exact_match_boost: f32,
}

impl Default for LexicalRerankConfig {
    fn default() -> Self {
        Self {
            coverage_weight: 0.7,
            density_weight: 0.2,
            exact_match_boost: 0.1,
        }
    }
}

/// Deterministic reranker that needs no model
pub struct LexicalReranker {
    config: LexicalRerankConfig,
}

impl LexicalReranker {
    /// Create new reranker with default config
    pub fn new() -> Self {
        Self {
            config: LexicalRerankConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: LexicalRerankConfig) -> Self {
        Self { config }
    }

    /// Score one candidate against the query
    pub fn score(&self, query: &str, candidate: &str) -> f32 {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() {
            return 0.0;
        }
        let candidate_terms = tokenize(candidate);
        if candidate_terms.is_empty() {
            return 0.0;
        }
        let candidate_set: HashSet<&String> = candidate_terms.iter().collect();

        let covered = query_terms
            .iter()
            .filter(|t| candidate_set.contains(t))
            .count();
        let coverage = covered as f32 / query_terms.len() as f32;

        let dense = candidate_terms
            .iter()
            .filter(|t| query_terms.contains(*t))
            .count();
        let density = dense as f32 / candidate_terms.len() as f32;

        let exact = if candidate.to_lowercase().contains(&query.trim().to_lowercase()) {
            self.config.exact_match_boost
        } else {
            0.0
        };

        let combined = coverage * self.config.coverage_weight
            + density * self.config.density_weight
            + exact;

        combined.clamp(0.0, 1.0)
    }

    pub fn config(&self) -> &LexicalRerankConfig {
        &self.config
    }
}

impl Default for LexicalReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, RerankError> {
        Ok(candidates.iter().map(|c| self.score(query, c)).collect())
    }
}
