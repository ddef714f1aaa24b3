//! Retrieval candidate
//!
//! A candidate is one piece of evidence from one source. Its score stays on
//! the source's own scale until the reranker overwrites it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Provenance map attached to every candidate
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the originating source
pub const SOURCE_KEY: &str = "source";

/// Metadata key for a `source` entry supplied with the document itself
pub const DOC_SOURCE_KEY: &str = "doc_source";

/// Metadata key holding the pre-rerank score
pub const SOURCE_SCORE_KEY: &str = "source_score";

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Graph,
    Keyword,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Graph => "graph",
            Source::Keyword => "keyword",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate evidence snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
    pub source: Source,
}

impl Candidate {
    /// Create a candidate; `metadata["source"]` is always set to `source`.
    pub fn new(content: impl Into<String>, score: f32, source: Source) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::from(source.as_str()));
        Self {
            content: content.into(),
            metadata,
            score,
            source,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge extra provenance without overriding the source tag. A `source`
    /// entry in `extra` is kept under `doc_source`.
    pub fn extend_metadata(&mut self, extra: Metadata) {
        for (key, value) in extra {
            if key == SOURCE_KEY {
                self.metadata.insert(DOC_SOURCE_KEY.to_string(), value);
            } else {
                self.metadata.insert(key, value);
            }
        }
    }

    /// Re-tag the candidate, keeping metadata and field in agreement
    pub fn tag_source(&mut self, source: Source) {
        self.source = source;
        self.metadata
            .insert(SOURCE_KEY.to_string(), Value::from(source.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_source_metadata() {
        let candidate = Candidate::new("气虚体质的特征", 0.8, Source::Keyword);
        assert_eq!(candidate.metadata[SOURCE_KEY], "keyword");
    }

    #[test]
    fn test_extend_metadata_keeps_source() {
        let mut candidate = Candidate::new("text", 1.0, Source::Graph);
        let mut extra = Metadata::new();
        extra.insert("source".into(), Value::from("somewhere-else"));
        extra.insert("doc_id".into(), Value::from("d1"));
        candidate.extend_metadata(extra);
        assert_eq!(candidate.metadata["source"], "graph");
        assert_eq!(candidate.metadata[DOC_SOURCE_KEY], "somewhere-else");
        assert_eq!(candidate.metadata["doc_id"], "d1");
    }

    #[test]
    fn test_tag_source() {
        let mut candidate = Candidate::new("text", 1.0, Source::Graph);
        candidate.tag_source(Source::Keyword);
        assert_eq!(candidate.source, Source::Keyword);
        assert_eq!(candidate.metadata["source"], "keyword");
    }
}
