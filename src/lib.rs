//! hybrid-rag - Hybrid knowledge retrieval for RAG
//!
//! Fuses evidence from a property graph and a keyword index, reranks it on a
//! single scale and returns a bounded, ordered, fault-tolerant result.
//!
//! # Architecture
//!
//! - **graph**: property-graph model, backend trait, fail-soft store
//! - **keyword**: lexical search trait and an in-memory BM25 index
//! - **rag**: rerankers and the retrieval orchestrator
//! - **config / telemetry / cli**: ambient layers for the binary

pub mod errors;
pub mod types;

// Leaf sources
pub mod graph;
pub mod keyword;

// Retrieval pipeline
pub mod rag;

// Interface layer
pub mod cli;
pub mod config;
pub mod telemetry;

// Re-export commonly used types
pub use config::RetrievalConfig;
pub use errors::{Result, RetrievalError};
pub use rag::{RetrievalOrchestrator, RetrieveOptions};
pub use types::{Candidate, RetrievalResult, Source};
