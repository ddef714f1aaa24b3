// Hybrid retrieval: graph and keyword sources fused into one ranked list
//
// Components:
// - Graph source: seed search plus neighborhood rendering
// - Fusion: duplicate collapsing, stable ranking
// - Orchestrator: concurrent fan-out and the end-to-end pipeline
pub mod fusion;
pub mod graph_source;
pub mod orchestrator;

pub use orchestrator::{RetrievalOrchestrator, RetrieveOptions};
