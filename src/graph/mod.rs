// Property graph: data model, backend seam, fail-soft store
//
// Components:
// - Model: nodes, relations, open property maps
// - Backend: outcome-typed trait every graph implementation provides
// - Store: fail-soft wrapper the retrieval path talks to
// - Memory: in-process backend with snapshots and statistics

pub mod backend;
pub mod matching;
pub mod memory;
pub mod model;
pub mod store;

pub use backend::{GraphBackend, StoreFailure, StoreResult};
pub use memory::{GraphSnapshot, GraphStatistics, InMemoryGraph};
pub use model::{Node, Properties, PropertyValue, Relation};
pub use store::GraphStore;
