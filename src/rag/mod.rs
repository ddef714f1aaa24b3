// Hybrid RAG retrieval
//
// Gathers candidate evidence from a property graph and a keyword index,
// reranks it on one scale and returns a bounded, ordered result.
//
// Components:
// - Retrieval: orchestrator, graph candidate synthesis, fusion
// - Re-ranking: reranker seam plus lexical and HTTP implementations

pub mod reranking;
pub mod retrieval;

// Re-export key types
pub use reranking::{HttpReranker, LexicalReranker, RerankError, Reranker};
pub use retrieval::{RetrievalOrchestrator, RetrieveOptions};
