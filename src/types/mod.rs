//! Type definitions module
//!
//! Candidate and result types shared by the sources, the reranker and the
//! orchestrator.

pub mod candidate;
pub mod result;

// Re-export commonly used types
pub use candidate::{Candidate, Metadata, Source, DOC_SOURCE_KEY, SOURCE_KEY, SOURCE_SCORE_KEY};
pub use result::RetrievalResult;
