//! Configuration for hybrid-rag
//!
//! TOML file with one section per pipeline stage. Every field has a default,
//! so a partial file (or none at all) is valid.
//! Location: ~/.hybrid-rag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{RetrievalError, Result};

/// Complete retrieval configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub retrieval: RetrievalSection,
    pub graph: GraphSection,
    pub keyword: KeywordSection,
    pub rerank: RerankSection,
    pub dedup: DedupSection,
}

/// Call defaults and source timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub default_top_k: usize,
    pub default_score_threshold: f32,
    /// Per-source deadline; unset means sources are awaited without limit
    pub source_timeout_ms: Option<u64>,
}

/// Graph-side candidate synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    pub max_seed_nodes: usize,
    pub max_depth: usize,
    /// Emit neighbors as candidates of their own, not only inside the seed snippet
    pub include_neighbors: bool,
    pub neighbor_decay: f32,
    pub max_neighbor_candidates: usize,
    pub max_related_in_snippet: usize,
}

/// Keyword-side search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSection {
    pub limit: usize,
}

/// Reranker selection and failure policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSection {
    /// HTTP cross-encoder endpoint; the lexical reranker is used when unset
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// Propagate reranker failures instead of falling back to source scores
    pub fail_on_error: bool,
}

/// Duplicate collapsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSection {
    pub enabled: bool,
    /// Character-bigram Jaccard similarity at which two snippets collapse;
    /// 1.0 collapses only identical normalized text
    pub near_duplicate_threshold: f32,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            default_score_threshold: 0.0,
            source_timeout_ms: None,
        }
    }
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            max_seed_nodes: 5,
            max_depth: 1,
            include_neighbors: false,
            neighbor_decay: 0.8,
            max_neighbor_candidates: 3,
            max_related_in_snippet: 8,
        }
    }
}

impl Default for KeywordSection {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

impl Default for RerankSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            max_retries: 2,
            fail_on_error: false,
        }
    }
}

impl Default for DedupSection {
    fn default() -> Self {
        Self {
            enabled: true,
            near_duplicate_threshold: 1.0,
        }
    }
}

impl RetrievalConfig {
    /// Standard config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".hybrid-rag").join("config.toml"))
    }

    /// Load and validate a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: RetrievalConfig = toml::from_str(&contents)
            .map_err(|e| RetrievalError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the standard location if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RetrievalError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RetrievalError::Config(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RetrievalError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_top_k == 0 {
            return Err(RetrievalError::Config(
                "default_top_k must be greater than 0".to_string(),
            ));
        }

        if !self.retrieval.default_score_threshold.is_finite() {
            return Err(RetrievalError::Config(
                "default_score_threshold must be finite".to_string(),
            ));
        }

        if self.retrieval.source_timeout_ms == Some(0) {
            return Err(RetrievalError::Config(
                "source_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.graph.neighbor_decay) {
            return Err(RetrievalError::Config(
                "neighbor_decay must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.dedup.near_duplicate_threshold)
            || self.dedup.near_duplicate_threshold == 0.0
        {
            return Err(RetrievalError::Config(
                "near_duplicate_threshold must be in (0.0, 1.0]".to_string(),
            ));
        }

        if let Some(endpoint) = &self.rerank.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(RetrievalError::Config(format!(
                    "Invalid reranker endpoint: {}",
                    endpoint
                )));
            }
        }

        Ok(())
    }

    pub fn source_timeout(&self) -> Option<Duration> {
        self.retrieval.source_timeout_ms.map(Duration::from_millis)
    }

    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank.timeout_ms)
    }
}
