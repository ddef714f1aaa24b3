// Lexical keyword search over a flat text corpus
//
// Components:
// - KeywordIndex: the seam the orchestrator depends on
// - Tokenizer: mixed Latin/Han term extraction
// - InMemoryKeywordIndex: BM25 implementation used by the CLI and tests

pub mod memory;
pub mod tokenizer;

use async_trait::async_trait;

use crate::types::Candidate;

pub use memory::{CorpusEntry, InMemoryKeywordIndex};

/// Limit used when the caller does not give one
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Lexical search backend.
///
/// Never fails for a well-formed query: backend errors are logged inside the
/// implementation and reported as an empty result.
#[async_trait]
pub trait KeywordIndex: Send + Sync {
    /// Up to `limit` candidates with source-local scores, best first.
    async fn search(&self, query: &str, limit: Option<usize>) -> Vec<Candidate>;
}
